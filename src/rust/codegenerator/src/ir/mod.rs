// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

pub mod expression;
pub mod instruction;

pub use expression::{Expression, FunctionCall, Reference, SetInstruction};
pub use instruction::CustomInstruction;
