// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Knobs steering one code-generation run.
#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    /// Emit `stop` at program end instead of looping indefinitely.
    pub run_once: bool,
    /// Emit explanatory comments into the output sections.
    pub verbose: bool,
    /// Preload the codeword table from this map file and restrict the
    /// compile to the entries it declares.
    pub map_input_file: Option<PathBuf>,
    /// Path prefix for collateral output files (e.g. the VCD trace written
    /// by the tracer outside this crate).
    pub output_prefix: String,
    /// Require every codeword-driven signal to carry a static codeword
    /// override in its instruction definition.
    pub require_static_codewords: bool,
}
