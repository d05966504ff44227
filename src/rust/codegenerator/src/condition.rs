// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Decoder for the guard expression of conditional instructions.
//!
//! The datapath PL can evaluate conditions over at most two bit registers,
//! so the accepted expression shapes are fixed: literals, a bare bit
//! reference, its negation, and (possibly negated) two-operand bit
//! functions. Anything else is a compiler bug upstream.

use crate::ir::{Expression, FunctionCall, Reference};
use crate::{Error, NUM_BREGS, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKind {
    Always,
    Never,
    Unary,
    Not,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    Nxor,
}

/// Decoded guard: kind plus up to two bit-register operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstructionCondition {
    pub kind: ConditionKind,
    pub operands: Vec<u32>,
}

impl InstructionCondition {
    pub const ALWAYS: InstructionCondition = InstructionCondition {
        kind: ConditionKind::Always,
        operands: Vec::new(),
    };

    pub fn is_always(&self) -> bool {
        self.kind == ConditionKind::Always
    }
}

impl Default for InstructionCondition {
    fn default() -> Self {
        InstructionCondition::ALWAYS
    }
}

fn breg_operand(expression: &Expression) -> Result<u32> {
    match expression {
        Expression::Reference(Reference::Breg(breg)) => {
            if *breg >= NUM_BREGS {
                return Err(Error::user(format!(
                    "bit register index {breg} exceeds maximum"
                )));
            }
            Ok(*breg)
        }
        other => Err(Error::internal(format!(
            "expected bit register operand, got '{other}'"
        ))),
    }
}

fn binary_kind(call: &FunctionCall, negated: bool) -> Result<ConditionKind> {
    let kind = match call.name.as_str() {
        "operator&" | "operator&&" => {
            if negated {
                ConditionKind::Nand
            } else {
                ConditionKind::And
            }
        }
        "operator|" | "operator||" => {
            if negated {
                ConditionKind::Nor
            } else {
                ConditionKind::Or
            }
        }
        "operator^" | "operator^^" | "operator!=" => {
            if negated {
                ConditionKind::Nxor
            } else {
                ConditionKind::Xor
            }
        }
        "operator==" => {
            if negated {
                ConditionKind::Xor
            } else {
                ConditionKind::Nxor
            }
        }
        _ => return Err(Error::internal("unsupported gate condition")),
    };
    Ok(kind)
}

/// Decode a guard expression into the datapath representation.
pub fn decode_condition(condition: &Expression) -> Result<InstructionCondition> {
    decode(condition).map_err(|e| e.with_context("in gate condition"))
}

fn decode(condition: &Expression) -> Result<InstructionCondition> {
    match condition {
        Expression::BitLiteral(true) => Ok(InstructionCondition {
            kind: ConditionKind::Always,
            operands: vec![],
        }),
        Expression::BitLiteral(false) => Ok(InstructionCondition {
            kind: ConditionKind::Never,
            operands: vec![],
        }),
        Expression::Reference(_) => Ok(InstructionCondition {
            kind: ConditionKind::Unary,
            operands: vec![breg_operand(condition)?],
        }),
        Expression::FunctionCall(call) => {
            if call.name == "operator!" || call.name == "operator~" {
                if call.operands.len() != 1 {
                    return Err(Error::internal("unsupported condition function"));
                }
                match &call.operands[0] {
                    Expression::Reference(_) => Ok(InstructionCondition {
                        kind: ConditionKind::Not,
                        operands: vec![breg_operand(&call.operands[0])?],
                    }),
                    Expression::FunctionCall(inner) => {
                        if inner.operands.len() != 2 {
                            return Err(Error::internal("unsupported condition function"));
                        }
                        Ok(InstructionCondition {
                            kind: binary_kind(inner, true)?,
                            operands: vec![
                                breg_operand(&inner.operands[0])?,
                                breg_operand(&inner.operands[1])?,
                            ],
                        })
                    }
                    _ => Err(Error::internal("unsupported gate condition")),
                }
            } else {
                if call.operands.len() != 2 {
                    return Err(Error::internal("unsupported condition function"));
                }
                Ok(InstructionCondition {
                    kind: binary_kind(call, false)?,
                    operands: vec![
                        breg_operand(&call.operands[0])?,
                        breg_operand(&call.operands[1])?,
                    ],
                })
            }
        }
        _ => Err(Error::internal("unsupported condition expression")),
    }
}
