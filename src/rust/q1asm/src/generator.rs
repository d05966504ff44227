// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use crate::Slot;
use crate::statements::{AsmStatement, SlotSel};

// Column widths of the assembly format: selector/label, mnemonic, operands,
// then the trailing comment.
const COL_SEL: usize = 16;
const COL_MNEMONIC: usize = 16;
const COL_OPERANDS: usize = 36;

/// Statement buffer for one output section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsmGenerator {
    statements: Vec<AsmStatement>,
}

impl AsmGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[AsmStatement] {
        &self.statements
    }

    pub fn num_statements(&self) -> usize {
        self.statements.len()
    }

    pub fn num_noncomment_statements(&self) -> usize {
        self.statements.iter().filter(|s| !s.is_comment()).count()
    }

    pub fn add_statement(&mut self, statement: AsmStatement) {
        self.statements.push(statement);
    }

    pub fn add_comment<S: Into<String>>(&mut self, text: S) {
        self.statements.push(AsmStatement::Comment { text: text.into() });
    }

    pub fn add_directive<S: Into<String>>(&mut self, name: S) {
        self.statements.push(AsmStatement::Directive { name: name.into() });
    }

    pub fn add_label<S1: Into<String>, S2: Into<String>>(&mut self, name: S1, comment: S2) {
        self.statements.push(AsmStatement::Label {
            name: name.into(),
            comment: comment.into(),
        });
    }

    /// Instruction line without a slot selector.
    pub fn add_instr<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        &mut self,
        mnemonic: S1,
        operands: S2,
        comment: S3,
    ) {
        self.statements.push(AsmStatement::Instr {
            sel: SlotSel::None,
            mnemonic: mnemonic.into(),
            operands: operands.into(),
            comment: comment.into(),
        });
    }

    /// Instruction line owned by a slot.
    pub fn add_slot_instr<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        &mut self,
        slot: Slot,
        mnemonic: S1,
        operands: S2,
        comment: S3,
    ) {
        self.statements.push(AsmStatement::Instr {
            sel: SlotSel::Slot(slot),
            mnemonic: mnemonic.into(),
            operands: operands.into(),
            comment: comment.into(),
        });
    }

    pub fn generate(&self) -> String {
        self.statements.iter().map(emit_statement).collect()
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

fn emit_statement(statement: &AsmStatement) -> String {
    match statement {
        AsmStatement::Comment { text } => format!("{}\n", text.trim_end()),
        AsmStatement::Directive { name } => format!("{name}\n"),
        AsmStatement::Label { name, comment } => {
            let label = format!("{name}:");
            if label.len() >= COL_SEL {
                // does not fit the first column
                format!("{label}\n")
            } else {
                let line = format!(
                    "{}{}{}{comment}",
                    pad(&label, COL_SEL),
                    pad("", COL_MNEMONIC),
                    pad("", COL_OPERANDS),
                );
                format!("{}\n", line.trim_end())
            }
        }
        AsmStatement::Instr {
            sel,
            mnemonic,
            operands,
            comment,
        } => {
            let sel = match sel {
                SlotSel::None => String::new(),
                SlotSel::Slot(slot) => format!("[{slot}]"),
            };
            let line = format!(
                "{}{}{}{comment}",
                pad(&sel, COL_SEL),
                pad(mnemonic, COL_MNEMONIC),
                pad(operands, COL_OPERANDS),
            );
            format!("{}\n", line.trim_end())
        }
    }
}
