// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::Slot;

/// First column of an instruction line: nothing, or the slot that owns the
/// emission (rendered as `[<slot>]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotSel {
    None,
    Slot(Slot),
}

/// A single line of the output program.
///
/// Statements are collected first and rendered to text at the very end, so
/// that a fatal error can still dump everything accumulated so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsmStatement {
    /// Verbatim line, including any leading `#`.
    Comment { text: String },
    /// Section marker such as `.CODE` or `.END`.
    Directive { name: String },
    /// Jump target. Rendered as `<name>:`, on its own line when too long
    /// for the first column.
    Label { name: String, comment: String },
    /// Four-column instruction line: selector, mnemonic, operands, comment.
    Instr {
        sel: SlotSel,
        mnemonic: String,
        operands: String,
        comment: String,
    },
}

impl AsmStatement {
    pub fn is_comment(&self) -> bool {
        matches!(self, AsmStatement::Comment { .. })
    }
}
