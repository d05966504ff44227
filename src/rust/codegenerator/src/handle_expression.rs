// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Expression lowering.
//!
//! Two entry modes share one recursive core: assignments materialize the
//! result into the destination register, conditions emit a jump to
//! `label_if_false` that fires on the *negation* of the expression. The
//! strict int/bit typing of the IR decides which shapes are legal where.
//!
//! The register file imposes two constraints that shape the emitted code:
//! operand order is fixed to `Rx,imm,Ry` / `Rx,Ry,Rz`, so literal-first
//! operand lists are swapped (with a sign fix for subtraction), and a
//! register written by one instruction must not be read by the next without
//! an intervening `nop`.

use log::debug;

use crate::codegen::Codegen;
use crate::ir::{Expression, FunctionCall, Reference, SetInstruction};
use crate::settings::Settings;
use crate::{Error, NUM_BREGS, NUM_CREGS, REG_TMP0, REG_TMP1, Result};

const INT_LITERAL_LIMIT: i64 = (1i64 << 32) - 1;

/// Literal window check. Callers request head or bottom room when they
/// adjust the literal to synthesize missing jump instructions.
fn check_int_literal(value: i64, bottom_room: i64, head_room: i64) -> Result<()> {
    if value - bottom_room < 0 {
        return Err(Error::user(format!(
            "backend cannot handle negative integer literals: value={value}, \
             bottom_room={bottom_room}"
        )));
    }
    if value >= INT_LITERAL_LIMIT - head_room {
        return Err(Error::user(format!(
            "backend requires integer literals limited to 32 bits: value={value}, \
             head_room={head_room}"
        )));
    }
    Ok(())
}

fn creg_reg(reference: &Reference) -> Result<u32> {
    match reference {
        Reference::Creg(reg) => {
            if *reg >= NUM_CREGS {
                return Err(Error::user(format!(
                    "register index {reg} exceeds maximum"
                )));
            }
            Ok(*reg)
        }
        Reference::Breg(_) => Err(Error::internal(
            "expected classical register reference, got bit register",
        )),
    }
}

fn breg_index(expression: &Expression) -> Result<u32> {
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
            "expected bit operand, got '{other}'"
        ))),
    }
}

/// Operand shapes of two-operand integer functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Profile {
    /// int literal, register
    LR,
    /// register, int literal
    RL,
    /// register, register
    RR,
}

fn get_profile(operands: &[Expression]) -> Result<Profile> {
    if operands.len() != 2 {
        return Err(Error::internal("expected 2 operands"));
    }
    match (&operands[0], &operands[1]) {
        (Expression::IntLiteral(_), Expression::Reference(_)) => Ok(Profile::LR),
        (Expression::Reference(_), Expression::IntLiteral(_)) => Ok(Profile::RL),
        (Expression::Reference(_), Expression::Reference(_)) => Ok(Profile::RR),
        (Expression::IntLiteral(_), Expression::IntLiteral(_)) => Err(Error::user(
            "cannot currently handle functions on two literal parameters",
        )),
        (Expression::FunctionCall(inner), _) | (_, Expression::FunctionCall(inner)) => {
            Err(Error::user(format!(
                "cannot handle function call within function call '{inner}'"
            )))
        }
        (a, b) => Err(Error::user(format!(
            "cannot handle parameter combination '{a}', '{b}'"
        ))),
    }
}

/// Render an integer operand (creg reference or literal) for an
/// instruction's operand list.
fn op_str_int(operand: &Expression) -> Result<String> {
    match operand {
        Expression::Reference(reference @ Reference::Creg(_)) => {
            Ok(format!("R{}", creg_reg(reference)?))
        }
        Expression::IntLiteral(value) => {
            check_int_literal(*value, 0, 0)?;
            Ok(value.to_string())
        }
        Expression::Reference(Reference::Breg(_)) => Err(Error::user(
            "expected integer operand, got bit register".to_string(),
        )),
        other => Err(Error::internal(format!(
            "expected integer operand, got '{other}'"
        ))),
    }
}

fn dest_reg(lhs: Option<&Reference>) -> Result<u32> {
    match lhs {
        Some(reference) => creg_reg(reference),
        None => Err(Error::user(
            "integer-valued expression cannot be used as a condition",
        )),
    }
}

fn label_required<'a>(label_if_false: Option<&'a str>, what: &str) -> Result<&'a str> {
    label_if_false.ok_or_else(|| {
        Error::user(format!("{what} is only supported in condition position"))
    })
}

/// DSM word transferred by a bit cast: one mask per operand bit.
struct BinCast {
    masks: Vec<u32>,
}

impl BinCast {
    fn total(&self) -> u32 {
        self.masks.iter().fold(0, |acc, mask| acc | mask)
    }
}

impl<S: Settings> Codegen<S> {
    /// Lower the right-hand side of an assignment into the lhs register.
    pub fn handle_set_instruction(&mut self, set: &SetInstruction, descr: &str) -> Result<()> {
        debug!("{descr}: '{set}'");
        self.do_handle_expression(&set.rhs, Some(&set.lhs), None, descr)
            .map_err(|e| e.with_context(format!("in expression '{}'", set.rhs)))
    }

    /// Lower a condition; control falls through when it holds and jumps to
    /// `label_if_false` when it does not.
    pub fn handle_expression(
        &mut self,
        expression: &Expression,
        label_if_false: &str,
        descr: &str,
    ) -> Result<()> {
        debug!("{descr}: '{expression}'");
        self.do_handle_expression(expression, None, Some(label_if_false), descr)
            .map_err(|e| e.with_context(format!("in expression '{expression}'")))
    }

    fn do_handle_expression(
        &mut self,
        expression: &Expression,
        lhs: Option<&Reference>,
        label_if_false: Option<&str>,
        descr: &str,
    ) -> Result<()> {
        if let Some(lhs) = lhs {
            self.comment(format!("# Expression '{descr}': {lhs} = {expression}"));
        }

        match expression {
            Expression::IntLiteral(value) => {
                check_int_literal(*value, 0, 0)?;
                let dest = dest_reg(lhs)?;
                self.emit("move", format!("{value},R{dest}"), format!("# {expression}"));
                Ok(())
            }
            Expression::BitLiteral(value) => {
                let label = label_required(label_if_false, "bit literal")?;
                if !*value {
                    self.emit("jmp", format!("@{label}"), format!("# {expression}"));
                }
                Ok(())
            }
            Expression::Reference(Reference::Creg(_)) => {
                if lhs.is_some() {
                    let src = op_str_int(expression)?;
                    let dest = dest_reg(lhs)?;
                    self.emit("move", format!("{src},R{dest}"), format!("# {expression}"));
                    Ok(())
                } else {
                    Err(Error::user(
                        "classical register cannot be used as a condition without a comparison",
                    ))
                }
            }
            Expression::Reference(Reference::Breg(_)) => {
                let label = label_required(label_if_false, "bit register read")?;
                let label = label.to_string();
                let cast = self.emit_bin_cast(&[expression])?;
                let mask = cast.total();
                self.emit("and", format!("{REG_TMP0},{mask},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit(
                    "jlt",
                    format!("{REG_TMP1},1,@{label}"),
                    format!("# {expression}"),
                );
                Ok(())
            }
            Expression::FunctionCall(call) => {
                self.lower_function_call(call, lhs, label_if_false)
            }
        }
    }

    fn lower_function_call(
        &mut self,
        call: &FunctionCall,
        lhs: Option<&Reference>,
        label_if_false: Option<&str>,
    ) -> Result<()> {
        // the int() cast is transparent; it must wrap a function call
        let call = if call.name == "int" {
            if call.operands.len() != 1 {
                return Err(Error::user("'int()' cast expects exactly one operand"));
            }
            match &call.operands[0] {
                Expression::FunctionCall(inner) => inner,
                _ => return Err(Error::user("'int()' cast target must be a function")),
            }
        } else {
            call
        };

        match call.name.as_str() {
            "operator~" => {
                if call.operands.len() != 1 {
                    return Err(Error::internal("expected 1 operand"));
                }
                let dest = dest_reg(lhs)?;
                let src = op_str_int(&call.operands[0])?;
                self.emit("not", format!("{src},R{dest}"), format!("# {call}"));
                Ok(())
            }
            "operator!" => {
                if call.operands.len() != 1 {
                    return Err(Error::internal("expected 1 operand"));
                }
                let label = label_required(label_if_false, "bit negation")?.to_string();
                let cast = self.emit_bin_cast(&[&call.operands[0]])?;
                let mask = cast.total();
                self.emit("and", format!("{REG_TMP0},{mask},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                // jump when the bit is set, i.e. when !bit is false
                self.emit(
                    "jge",
                    format!("{REG_TMP1},1,@{label}"),
                    format!("# {call}"),
                );
                Ok(())
            }
            "operator+" => self.lower_int_binary(call, "add", lhs),
            "operator-" => self.lower_int_binary(call, "sub", lhs),
            "operator&" => self.lower_int_binary(call, "and", lhs),
            "operator|" => self.lower_int_binary(call, "or", lhs),
            "operator^" => self.lower_int_binary(call, "xor", lhs),
            "operator&&" | "operator||" | "operator^^" => {
                self.lower_bit_binary(call, label_if_false)
            }
            "operator==" | "operator!=" => self.lower_equality(call, label_if_false),
            "operator>=" | "operator<" | "operator>" => {
                self.lower_relational(call, label_if_false)
            }
            "operator<=" => Err(Error::internal("'<=' not yet implemented")),
            other => Err(Error::internal(format!(
                "function '{other}' not supported by this backend"
            ))),
        }
    }

    fn lower_int_binary(
        &mut self,
        call: &FunctionCall,
        mnemonic: &str,
        lhs: Option<&Reference>,
    ) -> Result<()> {
        let dest = dest_reg(lhs)?;
        match get_profile(&call.operands)? {
            Profile::RL | Profile::RR => {
                let a = op_str_int(&call.operands[0])?;
                let b = op_str_int(&call.operands[1])?;
                self.emit(mnemonic, format!("{a},{b},R{dest}"), format!("# {call}"));
            }
            Profile::LR => {
                // swap operands to match the instruction set
                let a = op_str_int(&call.operands[1])?;
                let b = op_str_int(&call.operands[0])?;
                self.emit(mnemonic, format!("{a},{b},R{dest}"), format!("# {call}"));
                if mnemonic == "sub" {
                    // the swap changed the sign; negate the result
                    self.emit("nop", "", "");
                    self.emit(
                        "not",
                        format!("R{dest},R{dest}"),
                        "# fix sign of operand-swapped subtraction",
                    );
                    self.emit("nop", "", "");
                    self.emit("add", format!("R{dest},1,R{dest}"), "");
                }
            }
        }
        Ok(())
    }

    fn lower_equality(
        &mut self,
        call: &FunctionCall,
        label_if_false: Option<&str>,
    ) -> Result<()> {
        let label = label_required(label_if_false, "comparison")?.to_string();
        match get_profile(&call.operands)? {
            Profile::RL | Profile::RR => {
                let a = op_str_int(&call.operands[0])?;
                let b = op_str_int(&call.operands[1])?;
                self.emit("xor", format!("{a},{b},{REG_TMP0}"), format!("# {call}"));
            }
            Profile::LR => {
                let a = op_str_int(&call.operands[1])?;
                let b = op_str_int(&call.operands[0])?;
                self.emit("xor", format!("{a},{b},{REG_TMP0}"), format!("# {call}"));
            }
        }
        self.emit("nop", "", "");
        // nonzero xor means inequality
        let jump = if call.name == "operator==" { "jge" } else { "jlt" };
        self.emit(
            jump,
            format!("{REG_TMP0},1,@{label}"),
            "# skip next part if condition is false",
        );
        Ok(())
    }

    fn lower_relational(
        &mut self,
        call: &FunctionCall,
        label_if_false: Option<&str>,
    ) -> Result<()> {
        let label = label_required(label_if_false, "comparison")?.to_string();
        let profile = get_profile(&call.operands)?;
        let comment = "# skip next part if condition is false";

        match (call.name.as_str(), profile) {
            // a >= b is false iff a < b
            ("operator>=", Profile::RL | Profile::RR) => {
                let a = op_str_int(&call.operands[0])?;
                let b = op_str_int(&call.operands[1])?;
                self.emit("jlt", format!("{a},{b},@{label}"), comment);
            }
            // lit >= R is false iff R > lit, i.e. R >= lit+1
            ("operator>=", Profile::LR) => {
                let lit = int_literal(&call.operands[0])?;
                check_int_literal(lit, 0, 1)?;
                let reg = op_str_int(&call.operands[1])?;
                self.emit("jge", format!("{reg},{},@{label}", lit + 1), comment);
            }
            // a < b is false iff a >= b
            ("operator<", Profile::RL | Profile::RR) => {
                let a = op_str_int(&call.operands[0])?;
                let b = op_str_int(&call.operands[1])?;
                self.emit("jge", format!("{a},{b},@{label}"), comment);
            }
            // lit < R is false iff R <= lit, i.e. R < lit+1
            ("operator<", Profile::LR) => {
                let lit = int_literal(&call.operands[0])?;
                check_int_literal(lit, 0, 1)?;
                let reg = op_str_int(&call.operands[1])?;
                self.emit("jlt", format!("{reg},{},@{label}", lit + 1), comment);
            }
            // R > lit is false iff R < lit+1 (there is no jgt)
            ("operator>", Profile::RL) => {
                let lit = int_literal(&call.operands[1])?;
                check_int_literal(lit, 0, 1)?;
                let reg = op_str_int(&call.operands[0])?;
                self.emit("jlt", format!("{reg},{},@{label}", lit + 1), comment);
            }
            // Ra > Rb is false iff Ra < Rb+1
            ("operator>", Profile::RR) => {
                let a = op_str_int(&call.operands[0])?;
                let b = op_str_int(&call.operands[1])?;
                self.emit("add", format!("{b},1,{REG_TMP0}"), format!("# {call}"));
                self.emit("nop", "", "");
                self.emit("jlt", format!("{a},{REG_TMP0},@{label}"), comment);
            }
            // lit > R is false iff R >= lit
            ("operator>", Profile::LR) => {
                let lit = int_literal(&call.operands[0])?;
                check_int_literal(lit, 0, 0)?;
                let reg = op_str_int(&call.operands[1])?;
                self.emit("jge", format!("{reg},{lit},@{label}"), comment);
            }
            (name, _) => {
                return Err(Error::internal(format!(
                    "unexpected relational operator '{name}'"
                )));
            }
        }
        Ok(())
    }

    fn lower_bit_binary(
        &mut self,
        call: &FunctionCall,
        label_if_false: Option<&str>,
    ) -> Result<()> {
        let label = label_required(label_if_false, "bit logic")?.to_string();
        if call.operands.len() != 2 {
            return Err(Error::internal("expected 2 operands"));
        }
        let cast = self.emit_bin_cast(&[&call.operands[0], &call.operands[1]])?;
        let (mask_a, mask_b) = (cast.masks[0], cast.masks[1]);
        let total = cast.total();

        match call.name.as_str() {
            "operator&&" => {
                self.emit("and", format!("{REG_TMP0},{total},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                // zero iff all operand bits are set
                self.emit("xor", format!("{REG_TMP1},{total},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit(
                    "jge",
                    format!("{REG_TMP1},1,@{label}"),
                    format!("# {call}"),
                );
            }
            "operator||" => {
                self.emit("and", format!("{REG_TMP0},{total},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit(
                    "jlt",
                    format!("{REG_TMP1},1,@{label}"),
                    format!("# {call}"),
                );
            }
            "operator^^" => {
                // two-armed test: false when both bits are set or both clear
                let base = self.alloc_label_base("xb");
                let second = format!("{base}_second");
                let done = format!("{base}_done");
                self.emit("and", format!("{REG_TMP0},{mask_a},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit(
                    "jlt",
                    format!("{REG_TMP1},1,@{second}"),
                    format!("# {call}: first operand clear"),
                );
                self.emit("and", format!("{REG_TMP0},{mask_b},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit("jge", format!("{REG_TMP1},1,@{label}"), "# both set");
                self.emit("jmp", format!("@{done}"), "");
                self.emit_label(&second);
                self.emit("and", format!("{REG_TMP0},{mask_b},{REG_TMP1}"), "");
                self.emit("nop", "", "");
                self.emit("jlt", format!("{REG_TMP1},1,@{label}"), "# both clear");
                self.emit_label(&done);
            }
            other => {
                return Err(Error::internal(format!(
                    "unexpected bit operator '{other}'"
                )));
            }
        }
        Ok(())
    }

    /// Transfer the DSM word holding the operands' bits into `REG_TMP0`.
    ///
    /// All operand bits must live in the same 32-bit SM word; splitting a
    /// cast over several transfers is not supported.
    fn emit_bin_cast(&mut self, operands: &[&Expression]) -> Result<BinCast> {
        let mut sm_addr: Option<u32> = None;
        let mut masks = Vec::with_capacity(operands.len());

        for operand in operands {
            let breg = breg_index(operand)?;
            // the DSM bit was allocated when the readout was emitted
            let sm_bit = self.dp.sm_bit(breg)?;
            let word_addr = sm_bit / 32;
            match sm_addr {
                None => sm_addr = Some(word_addr),
                Some(addr) if addr != word_addr => {
                    return Err(Error::user(format!(
                        "cannot access DSM address {addr} and {word_addr} in a single transfer"
                    )));
                }
                Some(_) => {}
            }
            masks.push(1u32 << (sm_bit % 32));
        }

        let addr = sm_addr.unwrap_or(0);
        self.emit("seq_cl_sm", format!("S{addr}"), "");
        // prevent starvation of the real-time part during the transfer
        self.emit("seq_wait", "3", "");
        self.emit("move_sm", REG_TMP0, "");
        self.emit("nop", "", "");
        Ok(BinCast { masks })
    }
}

fn int_literal(expression: &Expression) -> Result<i64> {
    match expression {
        Expression::IntLiteral(value) => Ok(*value),
        other => Err(Error::internal(format!(
            "expected integer literal, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Expression as E;
    use crate::testutil::{emitted_ops, test_codegen};

    fn ops(code: &str) -> Vec<(String, String)> {
        emitted_ops(code)
    }

    fn set(lhs: u32, rhs: E) -> SetInstruction {
        SetInstruction {
            lhs: Reference::Creg(lhs),
            rhs,
        }
    }

    #[test]
    fn test_assign_literal_and_reference() {
        let mut cg = test_codegen();
        cg.handle_set_instruction(&set(0, E::IntLiteral(42)), "t").unwrap();
        cg.handle_set_instruction(&set(1, E::creg(0)), "t").unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("move".to_string(), "42,R0".to_string()),
                ("move".to_string(), "R0,R1".to_string()),
            ]
        );
    }

    #[test]
    fn test_literal_window() {
        let mut cg = test_codegen();
        assert!(
            cg.handle_set_instruction(&set(0, E::IntLiteral(-1)), "t")
                .is_err()
        );
        assert!(
            cg.handle_set_instruction(&set(0, E::IntLiteral((1i64 << 32) - 1)), "t")
                .is_err()
        );
        assert!(
            cg.handle_set_instruction(&set(0, E::IntLiteral((1i64 << 32) - 2)), "t")
                .is_ok()
        );
    }

    #[test]
    fn test_assign_binary_profiles() {
        let mut cg = test_codegen();
        // RL as written
        cg.handle_set_instruction(
            &set(2, E::call("operator+", vec![E::creg(0), E::IntLiteral(3)])),
            "t",
        )
        .unwrap();
        // LR swapped
        cg.handle_set_instruction(
            &set(2, E::call("operator+", vec![E::IntLiteral(3), E::creg(0)])),
            "t",
        )
        .unwrap();
        // RR as written
        cg.handle_set_instruction(
            &set(2, E::call("operator^", vec![E::creg(0), E::creg(1)])),
            "t",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("add".to_string(), "R0,3,R2".to_string()),
                ("add".to_string(), "R0,3,R2".to_string()),
                ("xor".to_string(), "R0,R1,R2".to_string()),
            ]
        );
    }

    #[test]
    fn test_sub_lr_negates_result() {
        let mut cg = test_codegen();
        cg.handle_set_instruction(
            &set(4, E::call("operator-", vec![E::IntLiteral(10), E::creg(1)])),
            "t",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("sub".to_string(), "R1,10,R4".to_string()),
                ("nop".to_string(), "".to_string()),
                ("not".to_string(), "R4,R4".to_string()),
                ("nop".to_string(), "".to_string()),
                ("add".to_string(), "R4,1,R4".to_string()),
            ]
        );
    }

    #[test]
    fn test_int_not() {
        let mut cg = test_codegen();
        cg.handle_set_instruction(&set(1, E::call("operator~", vec![E::creg(0)])), "t")
            .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![("not".to_string(), "R0,R1".to_string())]
        );
    }

    #[test]
    fn test_nested_function_calls_rejected() {
        let mut cg = test_codegen();
        let nested = E::call(
            "operator+",
            vec![
                E::call("operator+", vec![E::creg(0), E::IntLiteral(1)]),
                E::IntLiteral(1),
            ],
        );
        assert!(cg.handle_set_instruction(&set(0, nested), "t").is_err());
    }

    #[test]
    fn test_predicate_equality() {
        let mut cg = test_codegen();
        cg.handle_expression(
            &E::call("operator==", vec![E::creg(0), E::IntLiteral(7)]),
            "L_1",
            "if.condition",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("xor".to_string(), "R0,7,R62".to_string()),
                ("nop".to_string(), "".to_string()),
                ("jge".to_string(), "R62,1,@L_1".to_string()),
            ]
        );
    }

    #[test]
    fn test_predicate_less_than_uses_negated_jump() {
        let mut cg = test_codegen();
        cg.handle_expression(
            &E::call("operator<", vec![E::creg(0), E::IntLiteral(5)]),
            "L_1",
            "if.condition",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![("jge".to_string(), "R0,5,@L_1".to_string())]
        );
    }

    #[test]
    fn test_predicate_relational_profiles() {
        let mut cg = test_codegen();
        // R0 >= 5: jump when R0 < 5
        cg.handle_expression(
            &E::call("operator>=", vec![E::creg(0), E::IntLiteral(5)]),
            "L",
            "t",
        )
        .unwrap();
        // 5 >= R0: jump when R0 >= 6
        cg.handle_expression(
            &E::call("operator>=", vec![E::IntLiteral(5), E::creg(0)]),
            "L",
            "t",
        )
        .unwrap();
        // 5 < R0: jump when R0 < 6
        cg.handle_expression(
            &E::call("operator<", vec![E::IntLiteral(5), E::creg(0)]),
            "L",
            "t",
        )
        .unwrap();
        // 5 > R0: jump when R0 >= 5
        cg.handle_expression(
            &E::call("operator>", vec![E::IntLiteral(5), E::creg(0)]),
            "L",
            "t",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("jlt".to_string(), "R0,5,@L".to_string()),
                ("jge".to_string(), "R0,6,@L".to_string()),
                ("jlt".to_string(), "R0,6,@L".to_string()),
                ("jge".to_string(), "R0,5,@L".to_string()),
            ]
        );
    }

    #[test]
    fn test_predicate_greater_rr_synthesized() {
        let mut cg = test_codegen();
        cg.handle_expression(
            &E::call("operator>", vec![E::creg(0), E::creg(1)]),
            "L",
            "t",
        )
        .unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("add".to_string(), "R1,1,R62".to_string()),
                ("nop".to_string(), "".to_string()),
                ("jlt".to_string(), "R0,R62,@L".to_string()),
            ]
        );
    }

    #[test]
    fn test_greater_rl_literal_headroom() {
        let mut cg = test_codegen();
        // lit+1 must stay inside the 32-bit window
        assert!(
            cg.handle_expression(
                &E::call(
                    "operator>",
                    vec![E::creg(0), E::IntLiteral((1i64 << 32) - 2)]
                ),
                "L",
                "t",
            )
            .is_err()
        );
    }

    #[test]
    fn test_less_or_equal_unimplemented() {
        let mut cg = test_codegen();
        let err = cg
            .handle_expression(
                &E::call("operator<=", vec![E::creg(0), E::IntLiteral(5)]),
                "L",
                "t",
            )
            .unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_bit_literal_condition() {
        let mut cg = test_codegen();
        cg.handle_expression(&E::BitLiteral(true), "L", "t").unwrap();
        assert!(ops(&cg.code_section()).is_empty());
        cg.handle_expression(&E::BitLiteral(false), "L", "t").unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![("jmp".to_string(), "@L".to_string())]
        );
    }

    #[test]
    fn test_predicate_breg_reference() {
        let mut cg = test_codegen();
        cg.dp.allocate_sm_bit(3, 0).unwrap(); // breg 3 -> SM bit 0
        cg.handle_expression(&E::breg(3), "L", "t").unwrap();
        assert_eq!(
            ops(&cg.code_section()),
            vec![
                ("seq_cl_sm".to_string(), "S0".to_string()),
                ("seq_wait".to_string(), "3".to_string()),
                ("move_sm".to_string(), "R62".to_string()),
                ("nop".to_string(), "".to_string()),
                ("and".to_string(), "R62,1,R63".to_string()),
                ("nop".to_string(), "".to_string()),
                ("jlt".to_string(), "R63,1,@L".to_string()),
            ]
        );
    }

    #[test]
    fn test_predicate_bit_not_inverts_jump() {
        let mut cg = test_codegen();
        cg.dp.allocate_sm_bit(0, 0).unwrap();
        cg.handle_expression(&E::call("operator!", vec![E::breg(0)]), "L", "t")
            .unwrap();
        let emitted = ops(&cg.code_section());
        assert_eq!(emitted.last().unwrap().0, "jge");
    }

    #[test]
    fn test_bit_and_or() {
        let mut cg = test_codegen();
        cg.dp.allocate_sm_bit(0, 0).unwrap(); // SM bit 0, mask 1
        cg.dp.allocate_sm_bit(1, 0).unwrap(); // SM bit 1, mask 2
        cg.handle_expression(
            &E::call("operator&&", vec![E::breg(0), E::breg(1)]),
            "L",
            "t",
        )
        .unwrap();
        let emitted = ops(&cg.code_section());
        assert_eq!(
            emitted[4..],
            [
                ("and".to_string(), "R62,3,R63".to_string()),
                ("nop".to_string(), "".to_string()),
                ("xor".to_string(), "R63,3,R63".to_string()),
                ("nop".to_string(), "".to_string()),
                ("jge".to_string(), "R63,1,@L".to_string()),
            ]
        );

        let mut cg = test_codegen();
        cg.dp.allocate_sm_bit(0, 0).unwrap();
        cg.dp.allocate_sm_bit(1, 0).unwrap();
        cg.handle_expression(
            &E::call("operator||", vec![E::breg(0), E::breg(1)]),
            "L",
            "t",
        )
        .unwrap();
        let emitted = ops(&cg.code_section());
        assert_eq!(
            emitted[4..],
            [
                ("and".to_string(), "R62,3,R63".to_string()),
                ("nop".to_string(), "".to_string()),
                ("jlt".to_string(), "R63,1,@L".to_string()),
            ]
        );
    }

    #[test]
    fn test_bit_xor_two_arms() {
        let mut cg = test_codegen();
        cg.dp.allocate_sm_bit(0, 0).unwrap();
        cg.dp.allocate_sm_bit(1, 0).unwrap();
        cg.handle_expression(
            &E::call("operator^^", vec![E::breg(0), E::breg(1)]),
            "L",
            "t",
        )
        .unwrap();
        let code = cg.code_section();
        let emitted = ops(&code);
        // both arms jump to the false label, and the internal labels exist
        assert_eq!(
            emitted
                .iter()
                .filter(|(m, operands)| m == "jge" && operands.contains("@L")
                    || m == "jlt" && operands.contains("@L"))
                .count(),
            2
        );
        assert!(code.contains("__xb_0_second:"));
        assert!(code.contains("__xb_0_done:"));
    }

    #[test]
    fn test_bin_cast_requires_single_word() {
        let mut cg = test_codegen();
        // force bregs into different SM words
        for breg in 0..33 {
            cg.dp.allocate_sm_bit(breg, 0).unwrap();
        }
        let err = cg
            .handle_expression(
                &E::call("operator&&", vec![E::breg(0), E::breg(32)]),
                "L",
                "t",
            )
            .unwrap_err();
        assert!(matches!(err, Error::UserInput(_)));
    }

    #[test]
    fn test_breg_without_readout_rejected() {
        let mut cg = test_codegen();
        assert!(cg.handle_expression(&E::breg(9), "L", "t").is_err());
    }

    #[test]
    fn test_int_expression_rejected_as_condition() {
        let mut cg = test_codegen();
        assert!(
            cg.handle_expression(
                &E::call("operator+", vec![E::creg(0), E::IntLiteral(1)]),
                "L",
                "t",
            )
            .is_err()
        );
    }
}
