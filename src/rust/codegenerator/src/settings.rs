// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Contract towards the hardware-description provider.
//!
//! The backend never reads the platform JSON itself; it asks a [`Settings`]
//! implementation for instruments, control modes and signal resolutions.
//! The data structures here are the provider-independent views the backend
//! consumes.

use serde::Deserialize;

use crate::ir::CustomInstruction;
use crate::{Codeword, Result, Slot};

/// Wiring schema of one instrument: which DIO bits carry codewords or
/// masks, which carry triggers, and which carry readout results.
///
/// `control_bits` holds one bit-position list per group, ordered MSB→LSB.
/// A single-entry list means the group is driven by a mask bit rather than
/// a codeword.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ControlMode {
    #[serde(default)]
    pub name: String,
    pub control_bits: Vec<Vec<u8>>,
    #[serde(default)]
    pub trigger_bits: Vec<u8>,
    /// Result bit per group, present on measurement devices only.
    #[serde(default)]
    pub result_bits: Vec<u8>,
}

/// Per-instrument control info, immutable for one compile.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentControl {
    pub name: String,
    pub slot: Slot,
    pub control_mode: ControlMode,
    /// Number of groups the selected control mode drives.
    pub control_mode_group_cnt: usize,
    /// Channels per group; signal values must match this dimension.
    pub control_mode_group_size: usize,
    /// Emit conditional gates unconditionally on this instrument.
    pub force_cond_gates_on: bool,
    pub is_measurement_device: bool,
}

/// One entry of an instruction's signal vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    /// Index into the instruction's quantum operand list.
    pub operand_idx: usize,
    /// Raw signal value; macros are expanded during lowering.
    pub value: serde_json::Value,
    /// Signal type, e.g. "mw", "flux" or "measure".
    pub signal_type: String,
}

/// Signal vector defined for an instruction, plus the definition path for
/// error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDef {
    pub signals: Vec<SignalSpec>,
    pub path: String,
}

/// Resolution of (signal type, qubit) to the driving instrument group.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInfo {
    pub instr_idx: usize,
    pub group: usize,
    pub ic: InstrumentControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadoutMode {
    /// Result is distributed over the DSM for real-time feedback.
    Feedback,
    /// Result is retrieved offline; the sequencer takes no notice.
    Plain,
}

/// Questions the backend asks about the platform.
pub trait Settings {
    fn instruments_size(&self) -> usize;

    fn instrument_control(&self, instr_idx: usize) -> Result<InstrumentControl>;

    /// Signal vector defined for the given instruction.
    fn find_signal_definition(&self, instr: &CustomInstruction) -> Result<SignalDef>;

    /// Map a signal type and qubit to the instrument group driving it.
    fn find_signal_info_for_qubit(&self, signal_type: &str, qubit: u32) -> Result<SignalInfo>;

    fn is_readout(&self, instr: &CustomInstruction) -> bool;

    fn readout_mode(&self, instr: &CustomInstruction) -> ReadoutMode;

    /// Codeword pinned by the instruction definition, if any.
    fn find_static_codeword_override(
        &self,
        instr: &CustomInstruction,
        operand_idx: usize,
    ) -> Result<Option<Codeword>>;
}

/// Result bit feeding the DSM for the given group of a measurement device.
pub fn result_bit(ic: &InstrumentControl, group: usize) -> Result<u8> {
    ic.control_mode.result_bits.get(group).copied().ok_or_else(|| {
        crate::Error::user(format!(
            "no result bit defined for group {group} in control mode '{}' of instrument '{}'",
            ic.control_mode.name, ic.name
        ))
    })
}
