// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Datapath coordination: the DSM bit plane, the MUX tables routing
//! instrument result bits into DSM bits, and the PL tables deriving
//! conditional digital outputs from DSM bits.
//!
//! The tables are rendered into their own section, appended to the program
//! after the code section:
//!
//! ```text
//! .DATAPATH
//! [3]             .MUX            0               # feedback mux for 'ro_0'
//! [3]             .SM             S16,I1          # breg 4 (qubit 2)
//! [2]             .PL             0               # conditional gates for 'awg_0'
//! [2]             .COND           0x00000050,UNARY,S16    # group 0
//! .END
//! ```

use std::collections::BTreeMap;

use indexmap::IndexMap;
use q1asm::generator::AsmGenerator;

use crate::condition::{ConditionKind, InstructionCondition};
use crate::{DigOut, Error, Result, Slot};

/// Bit position within the distributed shared memory plane.
pub type SmBit = u32;

/// Size of the DSM plane in bits; `seq_cl_sm`/`seq_in_sm` address it in
/// 32-bit words.
pub const SM_BIT_CNT: SmBit = 1024;
/// Available MUX table entries.
pub const MUX_CNT: usize = 8;
/// Available PL table entries.
pub const PL_CNT: usize = 8;

/// Feedback routing for one group: which DSM bit receives which instrument
/// result bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackInfo {
    pub sm_bit: SmBit,
    pub result_bit: u8,
    pub breg: u32,
    pub qubit: u32,
}

/// Conditional output for one group: condition plus the digital word the PL
/// drives when the condition holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CondGateInfo {
    pub condition: InstructionCondition,
    pub group_dig_out: DigOut,
}

/// Keyed by group; `BTreeMap` so iteration (and thus emission and
/// content-addressing) is deterministic.
pub type FeedbackMap = BTreeMap<usize, FeedbackInfo>;
pub type CondGateMap = BTreeMap<usize, CondGateInfo>;

type MuxKey = (usize, Vec<(usize, SmBit, u8)>);
type PlKey = (usize, Vec<(usize, InstructionCondition, DigOut)>);

/// Mutable datapath state of one backend instance.
#[derive(Debug, Default)]
pub struct Datapath {
    section: AsmGenerator,
    sm_bit_by_breg: IndexMap<u32, SmBit>,
    next_sm_bit: SmBit,
    mux_by_content: IndexMap<MuxKey, usize>,
    pl_by_content: IndexMap<PlKey, usize>,
}

impl Datapath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program_start(&mut self) {
        self.section.add_directive(".DATAPATH");
    }

    pub fn program_finish(&mut self) {
        self.section.add_directive(".END");
    }

    /// Mirror a code-section comment so both sections can be matched up.
    pub fn comment<S: Into<String>>(&mut self, text: S, verbose: bool) {
        if verbose {
            self.section.add_comment(text);
        }
    }

    /// Rendered datapath section.
    pub fn section(&self) -> String {
        self.section.generate()
    }

    /// DSM bit backing the given bit register, allocating on first use.
    /// Allocation is append-only; a breg keeps its bit for the compile.
    pub fn allocate_sm_bit(&mut self, breg: u32, _instr_idx: usize) -> Result<SmBit> {
        if let Some(sm_bit) = self.sm_bit_by_breg.get(&breg) {
            return Ok(*sm_bit);
        }
        if self.next_sm_bit >= SM_BIT_CNT {
            return Err(Error::user(format!(
                "out of DSM bits: cannot allocate bit for breg {breg} \
                 (plane holds {SM_BIT_CNT} bits)"
            )));
        }
        let sm_bit = self.next_sm_bit;
        self.next_sm_bit += 1;
        self.sm_bit_by_breg.insert(breg, sm_bit);
        Ok(sm_bit)
    }

    /// DSM bit of a previously read-out bit register.
    pub fn sm_bit(&self, breg: u32) -> Result<SmBit> {
        self.sm_bit_by_breg.get(&breg).copied().ok_or_else(|| {
            Error::user(format!(
                "breg {breg} is used before any readout has assigned it a DSM bit"
            ))
        })
    }

    /// MUX entry for a feedback map, reusing identical content.
    pub fn get_or_assign_mux(&mut self, instr_idx: usize, map: &FeedbackMap) -> Result<usize> {
        let key: MuxKey = (
            instr_idx,
            map.iter()
                .map(|(group, fi)| (*group, fi.sm_bit, fi.result_bit))
                .collect(),
        );
        if let Some(mux) = self.mux_by_content.get(&key) {
            return Ok(*mux);
        }
        let mux = self.mux_by_content.len();
        if mux >= MUX_CNT {
            return Err(Error::user(format!(
                "out of datapath MUX entries (limit {MUX_CNT})"
            )));
        }
        self.mux_by_content.insert(key, mux);
        Ok(mux)
    }

    /// Emit the MUX table selecting instrument result bits into DSM bits.
    pub fn emit_mux(
        &mut self,
        mux: usize,
        map: &FeedbackMap,
        instrument_name: &str,
        slot: Slot,
    ) {
        self.section.add_slot_instr(
            slot,
            ".MUX",
            mux.to_string(),
            format!("# feedback mux for '{instrument_name}'"),
        );
        for (group, fi) in map {
            self.section.add_slot_instr(
                slot,
                ".SM",
                format!("S{},I{}", fi.sm_bit, fi.result_bit),
                format!("# group {group}: breg {} (qubit {})", fi.breg, fi.qubit),
            );
        }
    }

    /// PL entry for a conditional-gate map, reusing identical content.
    pub fn get_or_assign_pl(&mut self, instr_idx: usize, map: &CondGateMap) -> Result<usize> {
        let key: PlKey = (
            instr_idx,
            map.iter()
                .map(|(group, cg)| (*group, cg.condition.clone(), cg.group_dig_out))
                .collect(),
        );
        if let Some(pl) = self.pl_by_content.get(&key) {
            return Ok(*pl);
        }
        let pl = self.pl_by_content.len();
        if pl >= PL_CNT {
            return Err(Error::user(format!(
                "out of datapath PL entries (limit {PL_CNT})"
            )));
        }
        self.pl_by_content.insert(key, pl);
        Ok(pl)
    }

    /// Emit the PL table deriving conditional outputs from DSM bits.
    /// Returns the SM word address `seq_out_sm` must read.
    pub fn emit_pl(
        &mut self,
        pl: usize,
        map: &CondGateMap,
        instrument_name: &str,
        slot: Slot,
    ) -> Result<SmBit> {
        self.section.add_slot_instr(
            slot,
            ".PL",
            pl.to_string(),
            format!("# conditional gates for '{instrument_name}'"),
        );
        let mut sm_addr: Option<SmBit> = None;
        for (group, cg) in map {
            let mut operands = format!(
                "0x{:08X},{}",
                cg.group_dig_out,
                kind_name(cg.condition.kind)
            );
            for breg in &cg.condition.operands {
                let sm_bit = self.sm_bit(*breg)?;
                operands.push_str(&format!(",S{sm_bit}"));
                let addr = sm_bit / 32;
                sm_addr = Some(sm_addr.map_or(addr, |a| a.min(addr)));
            }
            self.section
                .add_slot_instr(slot, ".COND", operands, format!("# group {group}"));
        }
        Ok(sm_addr.unwrap_or(0))
    }

    /// SM word address of a feedback transfer (`seq_in_sm`).
    pub fn mux_sm_addr(map: &FeedbackMap) -> SmBit {
        map.values().map(|fi| fi.sm_bit / 32).min().unwrap_or(0)
    }

    /// DSM transfer size class for `seq_in_sm`: 1, 2, 4, 8 or 32 bits.
    pub fn size_tag(bit_cnt: usize) -> u32 {
        match bit_cnt {
            0 | 1 => 0,
            2 => 1,
            3..=4 => 2,
            5..=8 => 3,
            _ => 4,
        }
    }
}

fn kind_name(kind: ConditionKind) -> &'static str {
    match kind {
        ConditionKind::Always => "ALWAYS",
        ConditionKind::Never => "NEVER",
        ConditionKind::Unary => "UNARY",
        ConditionKind::Not => "NOT",
        ConditionKind::And => "AND",
        ConditionKind::Nand => "NAND",
        ConditionKind::Or => "OR",
        ConditionKind::Nor => "NOR",
        ConditionKind::Xor => "XOR",
        ConditionKind::Nxor => "NXOR",
    }
}
