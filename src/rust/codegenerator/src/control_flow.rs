// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Structured control flow: labels and jumps around block bodies.
//!
//! Every construct gets a unique label base from a per-backend monotone
//! counter; `_start`, `_end` and `_<branch>` suffixes derive the concrete
//! labels. Loops push their base onto a stack consulted by `do_break` and
//! `do_continue`.

use crate::codegen::{Codegen, IfFrame};
use crate::ir::{Expression, Reference, SetInstruction};
use crate::settings::Settings;
use crate::{Error, Result};

fn to_start(base: &str) -> String {
    format!("{base}_start")
}

fn to_end(base: &str) -> String {
    format!("{base}_end")
}

fn to_ifbranch(base: &str, branch: usize) -> String {
    format!("{base}_{branch}")
}

fn as_target(label: &str) -> String {
    format!("@{label}")
}

impl<S: Settings> Codegen<S> {
    pub(crate) fn alloc_label_base(&mut self, kind: &str) -> String {
        let n = self.label_count;
        self.label_count += 1;
        format!("__{kind}_{n}")
    }

    /*
     * if / elif / otherwise / end
     */

    /// Open the if statement (branch 0) or a further branch (branch > 0),
    /// lowering its condition. The branch body follows from the caller.
    pub fn if_elif(&mut self, condition: &Expression, branch: usize) -> Result<()> {
        if branch == 0 {
            let base = self.alloc_label_base("if");
            self.if_frames.push(IfFrame { base, branch: 0 });
        } else {
            let frame = self
                .if_frames
                .last_mut()
                .ok_or_else(|| Error::internal("elif without an open if statement"))?;
            frame.branch = branch;
        }
        let base = self
            .if_frames
            .last()
            .map(|frame| frame.base.clone())
            .expect("if frame was just pushed");

        if branch > 0 {
            // close the previous branch
            self.emit("jmp", as_target(&to_end(&base)), "");
        }

        self.comment(format!(
            "# IF_ELIF: condition = '{condition}', label = '{base}'"
        ));

        if branch > 0 {
            self.emit_label(to_ifbranch(&base, branch));
        }

        let jmp_label = to_ifbranch(&base, branch + 1);
        self.handle_expression(condition, &jmp_label, "if.condition")
    }

    /// Open the otherwise (else) branch.
    pub fn if_otherwise(&mut self, branch: usize) -> Result<()> {
        let base = self
            .if_frames
            .last()
            .map(|frame| frame.base.clone())
            .ok_or_else(|| Error::internal("otherwise without an open if statement"))?;

        self.emit("jmp", as_target(&to_end(&base)), "");
        self.comment(format!("# IF_OTHERWISE: label = '{base}'"));
        self.emit_label(to_ifbranch(&base, branch));
        Ok(())
    }

    /// Close the if statement. `had_otherwise` tells whether the final
    /// branch label was already placed by `if_otherwise`.
    pub fn if_end(&mut self, had_otherwise: bool) -> Result<()> {
        let frame = self
            .if_frames
            .pop()
            .ok_or_else(|| Error::internal("if_end without an open if statement"))?;

        self.comment(format!("# IF_END: label = '{}'", frame.base));
        if !had_otherwise {
            // the last condition still jumps to its branch label
            self.emit_label(to_ifbranch(&frame.base, frame.branch + 1));
        }
        self.emit_label(to_end(&frame.base));
        Ok(())
    }

    /*
     * foreach (inclusive literal range)
     */

    pub fn foreach_start(&mut self, lhs: &Reference, frm: i64) -> Result<()> {
        check_literal(frm)?;
        let base = self.alloc_label_base("loop");
        self.loop_labels.push(base.clone());

        self.comment(format!("# FOREACH_START: from = {frm}, label = '{base}'"));

        let reg = creg_name(lhs)?;
        self.emit("move", format!("{frm},{reg}"), "");
        self.emit_label(to_start(&base)); // loop and 'continue' target
        Ok(())
    }

    pub fn foreach_end(&mut self, lhs: &Reference, frm: i64, to: i64) -> Result<()> {
        let base = self
            .loop_labels
            .pop()
            .ok_or_else(|| Error::internal("foreach_end without foreach_start"))?;

        self.comment(format!(
            "# FOREACH_END: from = {frm}, to = {to}, label = '{base}'"
        ));

        let reg = creg_name(lhs)?;
        if to >= frm {
            // count up; the emitted bound is to+1, so demand head room
            check_literal_with_room(to, 0, 1)?;
            self.emit("add", format!("{reg},1,{reg}"), "");
            self.emit("nop", "", "");
            self.emit(
                "jlt",
                format!("{reg},{},{}", to + 1, as_target(&to_start(&base))),
                "# loop",
            );
        } else if to == 0 {
            // count down to zero: dedicated loop instruction
            self.emit(
                "loop",
                format!("{reg},{}", as_target(&to_start(&base))),
                "# loop",
            );
        } else {
            check_literal(to)?;
            self.emit("sub", format!("{reg},1,{reg}"), "");
            self.emit("nop", "", "");
            self.emit(
                "jge",
                format!("{reg},{to},{}", as_target(&to_start(&base))),
                "# loop",
            );
        }

        self.emit_label(to_end(&base)); // loop end and 'break' target
        Ok(())
    }

    /*
     * repeat ... until
     */

    pub fn repeat(&mut self) -> Result<()> {
        let base = self.alloc_label_base("repeat");
        self.loop_labels.push(base.clone());
        self.comment(format!("# REPEAT: label = '{base}'"));
        self.emit_label(to_start(&base));
        Ok(())
    }

    pub fn until(&mut self, condition: &Expression) -> Result<()> {
        let base = self
            .loop_labels
            .pop()
            .ok_or_else(|| Error::internal("until without repeat"))?;
        self.comment(format!(
            "# UNTIL: condition = '{condition}', label = '{base}'"
        ));
        self.handle_expression(condition, &to_end(&base), "until.condition")?;
        self.emit("jmp", as_target(&to_start(&base)), "# loop");
        self.emit_label(to_end(&base));
        Ok(())
    }

    /*
     * for / while
     */

    /// Also used for 'while' loops (no initializer, no update).
    pub fn for_start(
        &mut self,
        initialize: Option<&SetInstruction>,
        condition: &Expression,
    ) -> Result<()> {
        let base = self.alloc_label_base("for");
        self.loop_labels.push(base.clone());

        self.comment(format!(
            "# LOOP_START: {}condition = '{condition}'",
            initialize
                .map(|set| format!("initialize = '{set}', "))
                .unwrap_or_default()
        ));

        if let Some(initialize) = initialize {
            self.handle_set_instruction(initialize, "for.initialize")?;
            // the condition below likely reads the register just written
            self.emit("nop", "", "");
        }

        self.emit_label(to_start(&base));
        self.handle_expression(condition, &to_end(&base), "for/while.condition")
    }

    pub fn for_end(&mut self, update: Option<&SetInstruction>) -> Result<()> {
        let base = self
            .loop_labels
            .pop()
            .ok_or_else(|| Error::internal("for_end without for_start"))?;

        self.comment(format!(
            "# LOOP_END:{}",
            update
                .map(|set| format!(" update = '{set}'"))
                .unwrap_or_default()
        ));

        if let Some(update) = update {
            self.handle_set_instruction(update, "for.update")?;
        }
        self.emit("jmp", as_target(&to_start(&base)), "# loop");
        self.emit_label(to_end(&base));
        Ok(())
    }

    /*
     * break / continue
     */

    pub fn do_break(&mut self) -> Result<()> {
        let base = self
            .loop_labels
            .last()
            .ok_or_else(|| Error::user("'break' outside of any loop"))?
            .clone();
        self.emit("jmp", as_target(&to_end(&base)), "# break");
        Ok(())
    }

    pub fn do_continue(&mut self) -> Result<()> {
        let base = self
            .loop_labels
            .last()
            .ok_or_else(|| Error::user("'continue' outside of any loop"))?
            .clone();
        self.emit("jmp", as_target(&to_start(&base)), "# continue");
        Ok(())
    }
}

fn creg_name(reference: &Reference) -> Result<String> {
    match reference {
        Reference::Creg(reg) => {
            if *reg >= crate::NUM_CREGS {
                return Err(Error::user(format!(
                    "register index {reg} exceeds maximum"
                )));
            }
            Ok(format!("R{reg}"))
        }
        Reference::Breg(_) => Err(Error::internal(
            "loop variable must be a classical register",
        )),
    }
}

fn check_literal(value: i64) -> Result<()> {
    check_literal_with_room(value, 0, 0)
}

fn check_literal_with_room(value: i64, bottom_room: i64, head_room: i64) -> Result<()> {
    if value - bottom_room < 0 {
        return Err(Error::user(format!(
            "backend cannot handle negative integer literals: value={value}"
        )));
    }
    if value >= (1i64 << 32) - 1 - head_room {
        return Err(Error::user(format!(
            "backend requires integer literals limited to 32 bits: value={value}"
        )));
    }
    Ok(())
}
