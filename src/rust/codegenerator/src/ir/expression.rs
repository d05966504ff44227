// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Reference to a register of the classical machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reference {
    /// Classical (integer) register `R<n>`.
    Creg(u32),
    /// Bit register, backed by a DSM bit once a readout has populated it.
    Breg(u32),
}

/// Call of a named operator, e.g. `operator+` or `operator&&`.
///
/// Operator names follow the frontend convention (`operator<name>`); the
/// `int` cast also arrives as a function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub operands: Vec<Expression>,
}

/// Typed expression tree. Expressions are either `int`-typed (literals,
/// creg references, integer arithmetic) or `bit`-typed (bit literals, breg
/// references, bit logic, relational operators); the strict separation is
/// what lets the lowering engine pick assignment vs. predicate handling.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntLiteral(i64),
    BitLiteral(bool),
    Reference(Reference),
    FunctionCall(FunctionCall),
}

impl Expression {
    pub fn creg(index: u32) -> Self {
        Expression::Reference(Reference::Creg(index))
    }

    pub fn breg(index: u32) -> Self {
        Expression::Reference(Reference::Breg(index))
    }

    pub fn call<S: Into<String>>(name: S, operands: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall {
            name: name.into(),
            operands,
        })
    }
}

/// Assignment of an expression result to a classical register.
#[derive(Debug, Clone, PartialEq)]
pub struct SetInstruction {
    pub lhs: Reference,
    pub rhs: Expression,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Creg(index) => write!(f, "creg[{index}]"),
            Reference::Breg(index) => write!(f, "breg[{index}]"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntLiteral(value) => write!(f, "{value}"),
            Expression::BitLiteral(value) => write!(f, "{value}"),
            Expression::Reference(reference) => write!(f, "{reference}"),
            Expression::FunctionCall(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // operators render infix, anything else as a call
        if let Some(op) = self.name.strip_prefix("operator") {
            match self.operands.len() {
                1 => return write!(f, "{op}{}", self.operands[0]),
                2 => return write!(f, "{} {op} {}", self.operands[0], self.operands[1]),
                _ => {}
            }
        }
        write!(f, "{}(", self.name)?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{operand}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for SetInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
