// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Codeword bookkeeping.
//!
//! Every (instrument, group) owns an ordered list of signal-value strings;
//! the codeword of a signal is its index in that list. Index 0 is reserved
//! for the empty string, the idle codeword. Assignment is append-only, so a
//! codeword handed out once stays stable for the remainder of the compile
//! and across compiles when the table is persisted and preloaded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Codeword, Error, Result};

/// On-disk map file: free-text note plus the codeword table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapFile {
    pub note: String,
    pub codeword_table: IndexMap<String, Vec<Vec<String>>>,
}

#[derive(Debug, Clone, Default)]
pub struct CodewordTable {
    table: IndexMap<String, Vec<Vec<String>>>,
    preloaded: bool,
}

impl CodewordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table restricted to the entries of a previously emitted map file.
    pub fn preloaded(table: IndexMap<String, Vec<Vec<String>>>) -> Self {
        CodewordTable {
            table,
            preloaded: true,
        }
    }

    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    /// Find or assign the codeword for a signal value.
    ///
    /// Comparison is byte-exact on the macro-expanded signal string. On a
    /// preloaded table unknown instruments, groups or values are user
    /// errors; otherwise the structure grows on demand.
    pub fn assign(
        &mut self,
        instrument_name: &str,
        group: usize,
        signal_value: &str,
    ) -> Result<Codeword> {
        let preloaded = self.preloaded;
        if let Some(groups) = self.table.get_mut(instrument_name) {
            if group >= groups.len() {
                if preloaded {
                    return Err(preload_mismatch(format!(
                        "instrument '{instrument_name}', group {group} not present in file"
                    )));
                }
                groups.resize_with(group + 1, idle_group);
            }
            let codewords = &mut groups[group];
            if let Some(found) = codewords.iter().position(|cw| cw == signal_value) {
                return Ok(found as Codeword);
            }
            if preloaded {
                return Err(preload_mismatch(format!(
                    "signal value '{signal_value}' not found in group {group} \
                     of instrument '{instrument_name}'"
                )));
            }
            codewords.push(signal_value.to_string());
            Ok((codewords.len() - 1) as Codeword)
        } else {
            if preloaded {
                return Err(preload_mismatch(format!(
                    "instrument '{instrument_name}', group {group} not present in file"
                )));
            }
            let mut groups = Vec::new();
            groups.resize_with(group + 1, idle_group);
            groups[group].push(signal_value.to_string());
            let codeword = (groups[group].len() - 1) as Codeword;
            self.table.insert(instrument_name.to_string(), groups);
            Ok(codeword)
        }
    }

    /// Serializable map file carrying the table.
    pub fn to_map_file(&self) -> MapFile {
        MapFile {
            note: format!(
                "generated by {} version {}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ),
            codeword_table: self.table.clone(),
        }
    }
}

fn idle_group() -> Vec<String> {
    // codeword 0 is the idle (empty) signal
    vec![String::new()]
}

fn preload_mismatch(msg: String) -> Error {
    Error::user(format!(
        "mismatch between preloaded map input file and program requirements: {msg}"
    ))
}
