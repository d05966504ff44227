// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod codegen;
pub mod codeword;
pub mod condition;
mod control_flow;
pub mod datapath;
mod handle_expression;
pub mod ir;
pub mod options;
pub mod settings;
#[cfg(test)]
pub(crate) mod testutil;

pub use q1asm::Slot;

/// Scheduling quantum of the platform; all durations count cycles.
pub type Cycle = u64;
/// 32-bit digital output word driven onto an instrument's DIO interface.
pub type DigOut = u32;
/// Index into the ordered signal-value list of an (instrument, group).
pub type Codeword = u32;

/// Number of usable slots on the central controller backplane.
pub const MAX_SLOTS: Slot = 12;
/// Classical registers available to programs. The register file holds 64
/// registers; the top two are reserved as scratch for expression lowering.
pub const NUM_CREGS: u32 = 62;
/// Bit registers (backed by DSM bits once read out).
pub const NUM_BREGS: u32 = 1024;

/// Scratch registers reserved for expression lowering.
pub const REG_TMP0: &str = "R62";
pub const REG_TMP1: &str = "R63";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    UserInput(String),

    #[error(
        "signal conflict on instrument '{instrument}', group {group}, \
         between '{previous}' and '{new_value}'"
    )]
    SignalConflict {
        instrument: String,
        group: usize,
        previous: String,
        new_value: String,
    },

    #[error(
        "inconsistency detected in bundle contents: time travel not possible: \
         start_cycle={start_cycle}, last_end_cycle={last_end_cycle}, \
         instrument='{instrument}', instr_idx={instr_idx}"
    )]
    TimeTravel {
        instrument: String,
        instr_idx: usize,
        start_cycle: Cycle,
        last_end_cycle: Cycle,
    },

    #[error("internal compiler error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn user<S: Into<String>>(msg: S) -> Self {
        Error::UserInput(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Error::Internal(msg.into())
    }

    /// Append a layer of context to the message, keeping the error kind.
    pub fn with_context<S: std::fmt::Display>(self, context: S) -> Self {
        match self {
            Error::UserInput(msg) => Error::UserInput(format!("{msg} ({context})")),
            Error::Internal(msg) => Error::Internal(format!("{msg} ({context})")),
            Error::Anyhow(err) => Error::Anyhow(err.context(context.to_string())),
            other => other,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
