// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Shared fakes for the unit tests of this crate.

use crate::codegen::Codegen;
use crate::ir::CustomInstruction;
use crate::options::CodegenOptions;
use crate::settings::{
    ControlMode, InstrumentControl, ReadoutMode, Settings, SignalDef, SignalInfo,
};
use crate::{Error, Result};

/// Settings provider without any instruments; enough for expression and
/// control-flow lowering, which never touch the instrument tables.
pub(crate) struct EmptySettings;

impl Settings for EmptySettings {
    fn instruments_size(&self) -> usize {
        0
    }
    fn instrument_control(&self, _instr_idx: usize) -> Result<InstrumentControl> {
        Err(Error::internal("no instruments configured"))
    }
    fn find_signal_definition(&self, _instr: &CustomInstruction) -> Result<SignalDef> {
        Err(Error::internal("no instruments configured"))
    }
    fn find_signal_info_for_qubit(&self, _signal_type: &str, _qubit: u32) -> Result<SignalInfo> {
        Err(Error::internal("no instruments configured"))
    }
    fn is_readout(&self, _instr: &CustomInstruction) -> bool {
        false
    }
    fn readout_mode(&self, _instr: &CustomInstruction) -> ReadoutMode {
        ReadoutMode::Plain
    }
    fn find_static_codeword_override(
        &self,
        _instr: &CustomInstruction,
        _operand_idx: usize,
    ) -> Result<Option<crate::Codeword>> {
        Ok(None)
    }
}

/// Single instrument on slot 2 with one mask-driven group.
pub(crate) struct OneInstrument;

impl Settings for OneInstrument {
    fn instruments_size(&self) -> usize {
        1
    }
    fn instrument_control(&self, _instr_idx: usize) -> Result<InstrumentControl> {
        Ok(InstrumentControl {
            name: "awg_0".into(),
            slot: 2,
            control_mode: ControlMode {
                name: "awg8-mw".into(),
                control_bits: vec![vec![5]],
                trigger_bits: vec![6],
                result_bits: vec![],
            },
            control_mode_group_cnt: 1,
            control_mode_group_size: 1,
            force_cond_gates_on: false,
            is_measurement_device: false,
        })
    }
    fn find_signal_definition(&self, _instr: &CustomInstruction) -> Result<SignalDef> {
        Err(Error::internal("unused"))
    }
    fn find_signal_info_for_qubit(&self, _signal_type: &str, _qubit: u32) -> Result<SignalInfo> {
        Err(Error::internal("unused"))
    }
    fn is_readout(&self, _instr: &CustomInstruction) -> bool {
        false
    }
    fn readout_mode(&self, _instr: &CustomInstruction) -> ReadoutMode {
        ReadoutMode::Plain
    }
    fn find_static_codeword_override(
        &self,
        _instr: &CustomInstruction,
        _operand_idx: usize,
    ) -> Result<Option<crate::Codeword>> {
        Ok(None)
    }
}

pub(crate) fn test_codegen() -> Codegen<EmptySettings> {
    Codegen::new(EmptySettings, CodegenOptions::default()).unwrap()
}

/// The emitted code as (mnemonic, operands) pairs, labels as (":", name),
/// ignoring comments and directives.
pub(crate) fn emitted_ops(code: &str) -> Vec<(String, String)> {
    code.lines()
        .filter_map(|line| {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('.') {
                return None;
            }
            if !line.starts_with(' ') && !line.starts_with('[') {
                // label line ("name:", possibly followed by a comment)
                let label = trimmed.split(':').next().unwrap_or("").to_string();
                return Some((":".to_string(), label));
            }
            // strip the selector column if present
            let body = if line.starts_with('[') {
                line[line.find(' ')?..].trim_start()
            } else {
                trimmed
            };
            let mut parts = body.splitn(2, ' ');
            let mnemonic = parts.next()?.to_string();
            let rest = parts.next().unwrap_or("");
            let operands = rest
                .trim_start()
                .split('#')
                .next()
                .unwrap_or("")
                .trim()
                .to_string();
            Some((mnemonic, operands))
        })
        .collect()
}
