// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::Cycle;
use crate::ir::Expression;

/// A scheduled custom instruction (gate or readout), as delivered by the
/// upstream scheduler: every instance carries its start cycle and duration.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomInstruction {
    pub name: String,
    /// Quantum operands (qubit indices).
    pub operands: Vec<u32>,
    /// Explicit bit-register operands (readout targets).
    pub breg_operands: Vec<u32>,
    /// Guard expression; `true` for unconditional instructions.
    pub condition: Expression,
    pub start_cycle: Cycle,
    pub duration_cycles: Cycle,
    /// Instruction stems from a specialized definition with pre-bound
    /// operands. Not supported by this backend.
    pub specialized: bool,
}

impl CustomInstruction {
    pub fn new<S: Into<String>>(
        name: S,
        operands: Vec<u32>,
        start_cycle: Cycle,
        duration_cycles: Cycle,
    ) -> Self {
        CustomInstruction {
            name: name.into(),
            operands,
            breg_operands: Vec::new(),
            condition: Expression::BitLiteral(true),
            start_cycle,
            duration_cycles,
            specialized: false,
        }
    }

    pub fn with_condition(mut self, condition: Expression) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_breg_operands(mut self, breg_operands: Vec<u32>) -> Self {
        self.breg_operands = breg_operands;
        self
    }
}

impl fmt::Display for CustomInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for qubit in &self.operands {
            write!(f, " q[{qubit}]")?;
        }
        for breg in &self.breg_operands {
            write!(f, " breg[{breg}]")?;
        }
        Ok(())
    }
}
