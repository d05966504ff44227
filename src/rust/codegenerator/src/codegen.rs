// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Backend instance: per-cycle bundle lowering, slot cursors and program
//! framing.
//!
//! The calling driver opens a block, and for every cycle with instructions
//! calls `bundle_start`, `custom_instruction` once per instruction, then
//! `bundle_finish`, which flushes the collected per-(instrument, group)
//! work into emitted assembly. Code is collected as statements and rendered
//! at the end, so fatal errors can dump everything emitted so far.

use std::mem;

use log::{debug, error, info};
use q1asm::generator::AsmGenerator;

use crate::codeword::{CodewordTable, MapFile};
use crate::condition::{InstructionCondition, decode_condition};
use crate::datapath::{CondGateInfo, CondGateMap, Datapath, FeedbackInfo, FeedbackMap};
use crate::ir::CustomInstruction;
use crate::options::CodegenOptions;
use crate::settings::{
    InstrumentControl, ReadoutMode, Settings, SignalDef, SignalInfo, result_bit,
};
use crate::{Cycle, DigOut, Error, MAX_SLOTS, Result, Slot};

/// Work collected for one (instrument, group) while lowering one bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleInfo {
    /// Signal identity after macro expansion; empty means the group is
    /// unused in this bundle.
    pub signal_value: String,
    pub duration_in_cycles: Cycle,
    pub static_codeword_override: Option<crate::Codeword>,
    pub condition: InstructionCondition,
    /// Readout result is to be distributed over the DSM.
    pub is_meas_feedback: bool,
    /// Qubit operands of the feedback readout.
    pub operands: Vec<u32>,
    /// Explicit classical-bit operands of the feedback readout.
    pub breg_operands: Vec<u32>,
}

/// Per-instrument summary produced by the collect phase of one bundle.
#[derive(Debug, Default)]
struct CodeGenInfo {
    instrument_name: String,
    slot: Slot,
    instr_has_output: bool,
    dig_out: DigOut,
    instr_max_duration_in_cycles: Cycle,
    cond_gate_map: CondGateMap,
    feedback_map: FeedbackMap,
}

pub(crate) struct IfFrame {
    pub base: String,
    pub branch: usize,
}

struct CalcSignalValue {
    operand_idx: usize,
    signal_value: String,
    si: SignalInfo,
}

/// One backend instance serves one compilation.
pub struct Codegen<S: Settings> {
    pub(crate) settings: S,
    pub(crate) options: CodegenOptions,
    pub(crate) code: AsmGenerator,
    pub(crate) dp: Datapath,
    codeword_table: CodewordTable,
    bundle_info: Vec<Vec<BundleInfo>>,
    last_end_cycle: Vec<Cycle>,
    depth: usize,
    pub(crate) label_count: u64,
    pub(crate) loop_labels: Vec<String>,
    pub(crate) if_frames: Vec<IfFrame>,
}

impl<S: Settings> Codegen<S> {
    pub fn new(settings: S, options: CodegenOptions) -> Result<Self> {
        let mut codeword_table = CodewordTable::new();
        if let Some(path) = &options.map_input_file {
            debug!("loading map input file '{}'", path.display());
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::user(format!(
                    "cannot read map input file '{}': {e}",
                    path.display()
                ))
            })?;
            let map: MapFile = serde_json::from_str(&text).map_err(|e| {
                Error::user(format!(
                    "malformed map input file '{}': {e}",
                    path.display()
                ))
            })?;
            codeword_table = CodewordTable::preloaded(map.codeword_table);
        }

        let instrument_cnt = settings.instruments_size();
        for instr_idx in 0..instrument_cnt {
            let ic = settings.instrument_control(instr_idx)?;
            if !ic.control_mode.result_bits.is_empty() {
                info!(
                    "instrument '{}' (index {instr_idx}) can produce feedback results",
                    ic.name
                );
            }
        }

        Ok(Codegen {
            settings,
            options,
            code: AsmGenerator::new(),
            dp: Datapath::new(),
            codeword_table,
            bundle_info: Vec::new(),
            last_end_cycle: vec![0; instrument_cnt],
            depth: 0,
            label_count: 0,
            loop_labels: Vec::new(),
            if_frames: Vec::new(),
        })
    }

    /// Full program text: code section followed by the datapath section.
    pub fn program(&self) -> String {
        self.code.generate() + &self.dp.section()
    }

    /// Code section only.
    pub fn code_section(&self) -> String {
        self.code.generate()
    }

    /// Map file (codeword table) as pretty JSON.
    pub fn map_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.codeword_table.to_map_file())
            .map_err(|e| Error::Anyhow(e.into()))
    }

    /*
     * Program level
     */

    pub fn program_start(&mut self, prog_name: &str) {
        self.code.add_comment(format!("# Program: '{prog_name}'"));
        self.code
            .add_comment(format!("# Backend version: {}", env!("CARGO_PKG_VERSION")));
        self.code
            .add_comment("# Note:    generated by the Central Controller backend");
        self.code.add_comment("#");
        self.code.add_directive(".CODE");

        self.comment("# synchronous start and latency compensation");
        self.emit(
            "seq_bar",
            "",
            "# synchronization, delay set externally through SET_SEQ_BAR_CNT",
        );
        self.emit(
            "seq_out",
            "0x00000000,1",
            "# allows monitoring actual start time using trace unit",
        );
        if !self.options.run_once {
            self.comment("# start of main loop that runs indefinitely");
            self.code.add_label("__mainLoop", "# ");
        }
        self.emit("seq_state", "0", "# clear Programmable Logic state");

        self.dp.program_start();
    }

    pub fn program_finish(&mut self) {
        self.comment("# finish program");
        if self.options.run_once {
            self.emit("stop", "", "");
        } else {
            // keep the real-time pipeline fed across the backward jump
            self.emit("seq_wait", "1", "");
            self.emit("jmp", "@__mainLoop", "# loop indefinitely");
        }
        self.code.add_directive(".END");
        self.dp.program_finish();
    }

    /*
     * Block level
     */

    pub fn block_start(&mut self, block_name: &str, depth: usize) {
        self.depth = depth;
        if depth == 0 {
            self.comment("");
        }
        self.comment(format!("### Block: '{block_name}'"));
        // program time restarts at zero for every block
        for cycle in self.last_end_cycle.iter_mut() {
            *cycle = 0;
        }
    }

    pub fn block_finish(&mut self, block_name: &str, duration_in_cycles: Cycle, depth: usize) {
        self.comment(format!("### Block end: '{block_name}'"));
        debug!("block '{block_name}' spans {duration_in_cycles} cycles");
        self.depth = depth.saturating_sub(1);
    }

    /*
     * Bundle level
     */

    /// Rebuild the bundle scratch matrix: one row per instrument, one cell
    /// per control-mode group.
    pub fn bundle_start(&mut self, cmnt: &str) -> Result<()> {
        self.bundle_info.clear();
        for instr_idx in 0..self.settings.instruments_size() {
            let ic = self.settings.instrument_control(instr_idx)?;
            self.bundle_info
                .push(vec![BundleInfo::default(); ic.control_mode_group_cnt]);
        }
        self.comment(cmnt);
        self.dp.comment(cmnt, self.options.verbose);
        Ok(())
    }

    /// Scatter one instruction's signals into the bundle matrix. Code is
    /// generated later, in `bundle_finish`.
    pub fn custom_instruction(&mut self, instr: &CustomInstruction) -> Result<()> {
        self.custom_instruction_impl(instr)
            .map_err(|e| e.with_context(format!("in instruction '{instr}'")))
    }

    fn custom_instruction_impl(&mut self, instr: &CustomInstruction) -> Result<()> {
        if self.bundle_info.len() != self.settings.instruments_size() {
            return Err(Error::internal(
                "custom instruction outside a bundle (missing bundle_start)",
            ));
        }

        let cond = decode_condition(&instr.condition)?;

        if instr.specialized {
            return Err(Error::user(
                "cannot handle specialized instruction definitions (pre-bound operands)",
            ));
        }

        let is_readout = self.settings.is_readout(instr);
        if is_readout {
            self.comment(format!(" # READOUT: '{instr}'"));
        } else {
            self.comment(format!(" # gate '{instr}'"));
        }

        let sd = self.settings.find_signal_definition(instr)?;

        for s in 0..sd.signals.len() {
            let csv = self.calc_signal_value(&sd, s, &instr.operands, &instr.name)?;
            let instr_idx = csv.si.instr_idx;
            let group = csv.si.group;
            if instr_idx >= self.bundle_info.len() || group >= self.bundle_info[instr_idx].len() {
                return Err(Error::internal(format!(
                    "inconsistent group counts: signal resolves to instrument {instr_idx}, \
                     group {group}, outside the bundle matrix"
                )));
            }

            if !csv.signal_value.is_empty() {
                let previous = self.bundle_info[instr_idx][group].signal_value.clone();
                if previous.is_empty() {
                    let override_ = self
                        .settings
                        .find_static_codeword_override(instr, csv.operand_idx)?;
                    if self.options.require_static_codewords && override_.is_none() {
                        return Err(Error::user(format!(
                            "instruction '{}' drives a codeword on instrument '{}' but \
                             defines no static codeword override",
                            instr.name, csv.si.ic.name
                        )));
                    }
                    let bi = &mut self.bundle_info[instr_idx][group];
                    bi.signal_value = csv.signal_value.clone();
                    bi.static_codeword_override = override_;
                } else if previous == csv.signal_value {
                    // signal unchanged
                } else {
                    self.show_code_so_far();
                    return Err(Error::SignalConflict {
                        instrument: csv.si.ic.name.clone(),
                        group,
                        previous,
                        new_value: csv.signal_value.clone(),
                    });
                }
            }

            let bi = &mut self.bundle_info[instr_idx][group];
            bi.duration_in_cycles = instr.duration_cycles;
            bi.condition = cond.clone();

            if is_readout {
                if instr.operands.len() != 1 {
                    return Err(Error::user(format!(
                        "readout instruction '{instr}' requires exactly 1 quantum operand, \
                         not {}",
                        instr.operands.len()
                    )));
                }
                if self.settings.readout_mode(instr) == ReadoutMode::Feedback {
                    bi.is_meas_feedback = true;
                    bi.operands = instr.operands.clone();
                    bi.breg_operands = instr.breg_operands.clone();
                }
            }

            debug!(
                "custom instruction '{}': duration={} cycles, instr_idx={instr_idx}, \
                 group={group}",
                instr.name, instr.duration_cycles
            );
        }
        Ok(())
    }

    /// Flush the bundle matrix into emitted assembly.
    pub fn bundle_finish(
        &mut self,
        start_cycle: Cycle,
        duration_in_cycles: Cycle,
        is_last_bundle: bool,
    ) -> Result<()> {
        let bundle_info = mem::take(&mut self.bundle_info);
        let infos = self.collect_codegen_info(&bundle_info)?;

        let bundle_has_feedback = infos.iter().any(|info| !info.feedback_map.is_empty());

        for (instr_idx, info) in infos.iter().enumerate() {
            if is_last_bundle && instr_idx == 0 {
                self.comment(" # last bundle of kernel, will pad outputs to match durations");
            }

            if info.instr_has_output {
                self.emit_output(info, instr_idx, start_cycle)?;
            }

            if bundle_has_feedback {
                // every instrument advances by exactly one cycle, so the
                // slot cursors stay aligned across the DSM transfer
                self.emit_feedback(info, instr_idx, start_cycle)?;
            }

            if is_last_bundle {
                self.emit_pad_to_cycle(
                    instr_idx,
                    start_cycle + duration_in_cycles,
                    info.slot,
                    &info.instrument_name,
                )?;
            }
        }

        self.comment("");
        Ok(())
    }

    /*
     * Collect phase
     */

    fn collect_codegen_info(
        &mut self,
        bundle_info: &[Vec<BundleInfo>],
    ) -> Result<Vec<CodeGenInfo>> {
        let mut infos = Vec::with_capacity(bundle_info.len());
        for (instr_idx, groups) in bundle_info.iter().enumerate() {
            let ic = self.settings.instrument_control(instr_idx)?;
            if ic.slot >= MAX_SLOTS {
                return Err(Error::user(format!(
                    "illegal slot {} on instrument '{}'",
                    ic.slot, ic.name
                )));
            }

            let mut info = CodeGenInfo {
                instrument_name: ic.name.clone(),
                slot: ic.slot,
                ..CodeGenInfo::default()
            };

            let nr_groups = groups.len();
            for (group, bi) in groups.iter().enumerate() {
                if !bi.signal_value.is_empty() {
                    if bi.duration_in_cycles > info.instr_max_duration_in_cycles {
                        info.instr_max_duration_in_cycles = bi.duration_in_cycles;
                    }

                    let group_dig_out = self.calc_group_dig_out(group, nr_groups, &ic, bi)?;
                    info.dig_out |= group_dig_out;

                    if bi.condition.is_always() || ic.force_cond_gates_on {
                        // plain digital output
                    } else {
                        info.cond_gate_map.insert(
                            group,
                            CondGateInfo {
                                condition: bi.condition.clone(),
                                group_dig_out,
                            },
                        );
                    }

                    info.instr_has_output = true;
                }

                if bi.is_meas_feedback {
                    let res_bit = result_bit(&ic, group)?;
                    let qubit = *bi.operands.first().ok_or_else(|| {
                        Error::internal("feedback readout without quantum operand")
                    })?;
                    let breg = match bi.breg_operands.first() {
                        Some(breg) => {
                            info!("using explicit bit {breg} for qubit {qubit}");
                            *breg
                        }
                        None => {
                            // implicit classical bit mirrors the qubit index
                            info!("using implicit bit {qubit} for qubit {qubit}");
                            qubit
                        }
                    };
                    let sm_bit = self.dp.allocate_sm_bit(breg, instr_idx)?;
                    info.feedback_map.insert(
                        group,
                        FeedbackInfo {
                            sm_bit,
                            result_bit: res_bit,
                            breg,
                            qubit,
                        },
                    );
                }
            }
            infos.push(info);
        }
        Ok(infos)
    }

    /// Digital output contributed by one populated group: mask bit or
    /// packed codeword, plus trigger bits.
    fn calc_group_dig_out(
        &mut self,
        group: usize,
        nr_groups: usize,
        ic: &InstrumentControl,
        bi: &BundleInfo,
    ) -> Result<DigOut> {
        let mut dig_out: DigOut = 0;

        let group_cnt = ic.control_mode_group_cnt;
        let control_mode_group = if ic.control_mode.control_bits.is_empty() {
            return Err(Error::user(format!(
                "'control_bits' not defined or empty in control mode '{}'",
                ic.control_mode.name
            )));
        } else if group_cnt == 1 {
            // vector mode: the single control group carries all channels
            0
        } else if group < group_cnt {
            group
        } else {
            return Err(Error::user(format!(
                "instrument '{}' uses {nr_groups} groups, but control mode '{}' only \
                 defines {group_cnt} groups in 'control_bits'",
                ic.name, ic.control_mode.name
            )));
        };

        let group_control_bits = ic
            .control_mode
            .control_bits
            .get(control_mode_group)
            .ok_or_else(|| {
                Error::internal(format!(
                    "inconsistent group counts on instrument '{}': control mode group \
                     {control_mode_group} missing from 'control_bits'",
                    ic.name
                ))
            })?;
        debug!(
            "instrument '{}', slot {}, control mode group {control_mode_group}, \
             control bits {:?}",
            ic.name, ic.slot, group_control_bits
        );

        let nr_bits = group_control_bits.len();
        if nr_bits == 1 {
            // single bit implies a mask, active high
            dig_out |= dio_bit(group_control_bits[0], &ic.name)?;
        } else if nr_bits > 1 {
            // more than one bit implies a codeword
            let (codeword, overridden) = match bi.static_codeword_override {
                Some(codeword) => (codeword, true),
                None => (
                    self.codeword_table
                        .assign(&ic.name, group, &bi.signal_value)?,
                    false,
                ),
            };
            for (idx, bit_pos) in group_control_bits.iter().enumerate() {
                let codeword_bit = nr_bits - 1 - idx; // control_bits lists MSB..LSB
                if codeword_bit < 32 && codeword & (1u32 << codeword_bit) != 0 {
                    dig_out |= dio_bit(*bit_pos, &ic.name)?;
                }
            }
            self.comment(format!(
                "  # slot={}, instrument='{}', group={group}: codeword={codeword}{}: \
                 groupDigOut=0x{dig_out:08X}",
                ic.slot,
                ic.name,
                if overridden { " (static override)" } else { "" },
            ));
        } else {
            return Err(Error::user(format!(
                "key 'control_bits' empty for group {control_mode_group} on instrument '{}'",
                ic.name
            )));
        }

        // add trigger bits
        let trigger_bits = &ic.control_mode.trigger_bits;
        match trigger_bits.len() {
            0 => {}
            1 => dig_out |= dio_bit(trigger_bits[0], &ic.name)?,
            2 => {
                // both triggers raised; needed by two-trigger instruments
                dig_out |= dio_bit(trigger_bits[0], &ic.name)?;
                dig_out |= dio_bit(trigger_bits[1], &ic.name)?;
            }
            n if n == nr_groups => dig_out |= dio_bit(trigger_bits[group], &ic.name)?,
            n => {
                return Err(Error::user(format!(
                    "instrument '{}' uses {nr_groups} groups, but control mode '{}' \
                     defines {n} trigger bits in 'trigger_bits' (must be 1 or #groups)",
                    ic.name, ic.control_mode.name
                )));
            }
        }

        Ok(dig_out)
    }

    /// Signal value string for one entry of an instruction's signal vector:
    /// operand mapping, macro expansion and dimension check.
    fn calc_signal_value(
        &mut self,
        sd: &SignalDef,
        s: usize,
        operands: &[u32],
        iname: &str,
    ) -> Result<CalcSignalValue> {
        let spec = &sd.signals[s];
        let path = format!("{}[{s}]", sd.path);

        if spec.operand_idx >= operands.len() {
            return Err(Error::user(format!(
                "instruction '{iname}': definition uses operand_idx {}, but only {} \
                 operands were provided",
                spec.operand_idx,
                operands.len()
            )));
        }
        let qubit = operands[spec.operand_idx];

        let si = self
            .settings
            .find_signal_info_for_qubit(&spec.signal_type, qubit)?;

        let signal_value = if json_is_empty(&spec.value) {
            // empty implies no signal
            String::new()
        } else {
            let size = match &spec.value {
                serde_json::Value::Array(values) => values.len(),
                serde_json::Value::Object(map) => map.len(),
                _ => 1,
            };
            if size != si.ic.control_mode_group_size {
                log::warn!(
                    "signal dimension mismatch on instruction '{iname}': control mode '{}' \
                     requires {} signals, but '{path}/value' provides {size} (value='{}')",
                    si.ic.control_mode.name,
                    si.ic.control_mode_group_size,
                    spec.value
                );
            }

            let sv = serde_json::to_string(&spec.value).map_err(|e| Error::Anyhow(e.into()))?;
            sv.replace('"', "")
                .replace("{gateName}", iname)
                .replace("{instrumentName}", &si.ic.name)
                .replace("{instrumentGroup}", &si.group.to_string())
                .replace("{qubit}", &qubit.to_string())
        };

        self.comment(format!(
            "  # slot={}, instrument='{}', group={}: signalValue='{signal_value}'",
            si.ic.slot, si.ic.name, si.group
        ));

        Ok(CalcSignalValue {
            operand_idx: spec.operand_idx,
            signal_value,
            si,
        })
    }

    /*
     * Emit phase
     */

    fn emit_output(
        &mut self,
        info: &CodeGenInfo,
        instr_idx: usize,
        start_cycle: Cycle,
    ) -> Result<()> {
        self.comment(format!(
            "  # slot={}, instrument='{}': lastEndCycle={}, startCycle={start_cycle}, \
             instrMaxDurationInCycles={}",
            info.slot,
            info.instrument_name,
            self.last_end_cycle[instr_idx],
            info.instr_max_duration_in_cycles,
        ));

        self.emit_pad_to_cycle(instr_idx, start_cycle, info.slot, &info.instrument_name)?;

        let duration = info.instr_max_duration_in_cycles;
        if info.cond_gate_map.is_empty() {
            // all groups unconditional
            self.code.add_slot_instr(
                info.slot,
                "seq_out",
                format!("0x{:08X},{duration}", info.dig_out),
                format!(
                    "# cycle {start_cycle}-{}: code word/mask on '{}'",
                    start_cycle + duration,
                    info.instrument_name
                ),
            );
        } else {
            // at least one group conditional: go through the PL
            let pl = self.dp.get_or_assign_pl(instr_idx, &info.cond_gate_map)?;
            let sm_addr =
                self.dp
                    .emit_pl(pl, &info.cond_gate_map, &info.instrument_name, info.slot)?;
            self.code.add_slot_instr(
                info.slot,
                "seq_out_sm",
                format!("S{sm_addr},{pl},{duration}"),
                format!(
                    "# cycle {start_cycle}-{}: conditional code word/mask on '{}'",
                    start_cycle + duration,
                    info.instrument_name
                ),
            );
        }

        self.last_end_cycle[instr_idx] = start_cycle + duration;
        Ok(())
    }

    /// Input of measurement results and DSM distribution. Participating and
    /// non-participating instruments must take the same number of sequencer
    /// cycles.
    fn emit_feedback(
        &mut self,
        info: &CodeGenInfo,
        instr_idx: usize,
        start_cycle: Cycle,
    ) -> Result<()> {
        if start_cycle > self.last_end_cycle[instr_idx] {
            // instrument had no output in this bundle
            self.emit_pad_to_cycle(instr_idx, start_cycle, info.slot, &info.instrument_name)?;
        }

        let last = self.last_end_cycle[instr_idx];
        if !info.feedback_map.is_empty() {
            let mux = self.dp.get_or_assign_mux(instr_idx, &info.feedback_map)?;
            self.dp
                .emit_mux(mux, &info.feedback_map, &info.instrument_name, info.slot);

            let size_tag = Datapath::size_tag(info.feedback_map.len());
            let sm_addr = Datapath::mux_sm_addr(&info.feedback_map);
            self.code.add_slot_instr(
                info.slot,
                "seq_in_sm",
                format!("S{sm_addr},{mux},{size_tag}"),
                format!(
                    "# cycle {last}-{}: feedback on '{}'",
                    last + 1,
                    info.instrument_name
                ),
            );
        } else {
            self.code.add_slot_instr(
                info.slot,
                "seq_inv_sm",
                "S0,1",
                format!(
                    "# cycle {last}-{}: invalidate SM on '{}'",
                    last + 1,
                    info.instrument_name
                ),
            );
        }
        self.last_end_cycle[instr_idx] += 1;
        Ok(())
    }

    /// Advance an instrument's cursor to `start_cycle`, emitting padding
    /// when behind. A cursor beyond `start_cycle` is a fatal inconsistency.
    pub(crate) fn emit_pad_to_cycle(
        &mut self,
        instr_idx: usize,
        start_cycle: Cycle,
        slot: Slot,
        instrument_name: &str,
    ) -> Result<()> {
        let last = self.last_end_cycle[instr_idx];
        if start_cycle < last {
            error!("inconsistency detected in bundle contents: dumping code generated so far");
            self.show_code_so_far();
            return Err(Error::TimeTravel {
                instrument: instrument_name.to_string(),
                instr_idx,
                start_cycle,
                last_end_cycle: last,
            });
        }

        let pre_padding = start_cycle - last;
        if pre_padding > 0 {
            self.code.add_slot_instr(
                slot,
                "seq_wait",
                pre_padding.to_string(),
                format!("# cycle {last}-{start_cycle}: padding on '{instrument_name}'"),
            );
        }

        self.last_end_cycle[instr_idx] = start_cycle;
        Ok(())
    }

    /*
     * Helpers shared with the expression and control-flow lowering
     */

    pub(crate) fn emit<S1, S2, S3>(&mut self, mnemonic: S1, operands: S2, cmnt: S3)
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        self.code.add_instr(mnemonic, operands, cmnt);
    }

    pub(crate) fn emit_label<S1: Into<String>>(&mut self, name: S1) {
        self.code.add_label(name, "");
    }

    /// Emit a comment line, indented by block depth. Only in verbose mode.
    pub(crate) fn comment<SC: Into<String>>(&mut self, text: SC) {
        if !self.options.verbose {
            return;
        }
        let text = text.into();
        if text.is_empty() {
            self.code.add_comment("");
        } else {
            self.code
                .add_comment(format!("{}{}", "  ".repeat(self.depth), text));
        }
    }

    /// Dump accumulated code to the log, as context for fatal errors.
    pub(crate) fn show_code_so_far(&self) {
        error!("code so far:\n{}", self.code.generate());
    }
}

fn dio_bit(position: u8, instrument_name: &str) -> Result<DigOut> {
    if position >= 32 {
        return Err(Error::user(format!(
            "bit position {position} on instrument '{instrument_name}' exceeds the \
             32-bit digital interface"
        )));
    }
    Ok(1 << position)
}

fn json_is_empty(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(text) => text.is_empty(),
        serde_json::Value::Array(values) => values.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
