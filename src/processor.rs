// This is the place for the basic interpreter implementation: the evaluation
// loop that drives one sample through the loaded instruction list, and the
// register/delay-line/accumulator state that loop reads and writes. The
// details of how individual opcodes behave live in the instructions module.

use crate::fields::{float_to_int, int_to_float, set_ccr};
use crate::fields::{Gpr, RegisterType};
use crate::instructions::Instruction;
use crate::noise::WhiteNoise;
use crate::parser::CCR_INDEX;
use crate::tables::LookupFamily;
use crate::tram::Tram;
use tracing::trace;

/// The FX8010 virtual machine: register file, delay memory, lookup tables and
/// the accumulator, wired together by the per-sample evaluation loop.
pub struct Vm {
    pub(crate) registers: Vec<Gpr>,
    instructions: Vec<Instruction>,
    pub(crate) accumulator: f64,
    pub(crate) log_tables: LookupFamily,
    pub(crate) exp_tables: LookupFamily,
    pub(crate) i_tram: Tram,
    pub(crate) x_tram: Tram,
    noise: WhiteNoise,
    pub(crate) skip_counter: i32,
    instruction_counter: u64,
    channel_count: u32,
    output_frame: Vec<f32>,
    /// When `false` (the default), INPUT operands on A/X/Y are all loaded from A's
    /// io_index, reproducing the reference implementation's behavior verbatim. When
    /// `true`, each operand is loaded from its own io_index instead.
    pub correct_input_indexing: bool,
}

impl Vm {
    pub(crate) fn new(
        registers: Vec<Gpr>,
        instructions: Vec<Instruction>,
        itram_size: usize,
        xtram_size: usize,
        channel_count: u32,
    ) -> Self {
        Vm {
            registers,
            instructions,
            accumulator: 0.0,
            log_tables: LookupFamily::log(),
            exp_tables: LookupFamily::exp(),
            i_tram: Tram::new(itram_size.max(1)),
            x_tram: Tram::new(xtram_size.max(1)),
            noise: WhiteNoise::default(),
            skip_counter: 0,
            instruction_counter: 0,
            channel_count,
            output_frame: vec![0.0; channel_count.max(1) as usize],
            correct_input_indexing: false,
        }
    }

    pub fn instruction_counter(&self) -> u64 {
        self.instruction_counter
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    pub fn get_register(&self, name: &str) -> Option<f32> {
        self.registers.iter().find(|r| r.name == name).map(|r| r.value)
    }

    pub fn set_register(&mut self, name: &str, value: f32) -> bool {
        match self.registers.iter_mut().find(|r| r.name == name) {
            Some(r) => {
                r.value = value;
                true
            }
            None => false,
        }
    }

    /// Drives one input frame through the full instruction list, in program
    /// order, stopping as soon as END is observed.
    pub fn process(&mut self, input_frame: &[f32]) -> Vec<f32> {
        self.skip_counter = 0;
        self.output_frame.iter_mut().for_each(|s| *s = 0.0);

        let instructions = std::mem::take(&mut self.instructions);
        for instruction in &instructions {
            if self.skip_counter > 0 {
                self.skip_counter -= 1;
                continue;
            }

            self.load_operands(instruction, input_frame);

            let reached_end = instruction.execute(self);
            self.instruction_counter += 1;
            trace!(
                opcode = ?instruction.opcode,
                r = instruction.r,
                accumulator = self.accumulator,
                "executed instruction"
            );

            let r = &self.registers[instruction.r];
            if r.reg_type == RegisterType::Output {
                let io_index = r.io_index as usize;
                let value = r.value;
                self.pending_output(io_index, value);
            }

            if reached_end {
                break;
            }
        }
        self.instructions = instructions;

        self.output_frame.clone()
    }

    fn load_operands(&mut self, instruction: &Instruction, input_frame: &[f32]) {
        if instruction.has_input {
            let source_index = if self.correct_input_indexing {
                None
            } else {
                Some(self.registers[instruction.a].io_index)
            };
            for &operand in &[instruction.a, instruction.x, instruction.y] {
                if self.registers[operand].reg_type == RegisterType::Input {
                    let io_index = source_index.unwrap_or(self.registers[operand].io_index);
                    if let Some(&sample) = input_frame.get(io_index as usize) {
                        self.registers[operand].value = sample;
                    }
                }
            }
        }
        if instruction.has_noise {
            for &operand in &[instruction.a, instruction.x, instruction.y] {
                if self.registers[operand].name == "noise" {
                    self.registers[operand].value = self.noise.next();
                }
            }
        }
    }

    pub(crate) fn pending_output(&mut self, io_index: usize, value: f32) {
        if let Some(slot) = self.output_frame.get_mut(io_index) {
            *slot = value;
        }
    }

    pub(crate) fn update_ccr(&mut self, result: f32) {
        self.registers[CCR_INDEX].value = set_ccr(result) as f32;
    }

    pub(crate) fn ccr_raw(&self) -> i32 {
        self.registers[CCR_INDEX].value as i32
    }

    pub(crate) fn set_borrow(&mut self, borrow: bool) {
        let mut raw = self.registers[CCR_INDEX].value as i32;
        if borrow {
            raw |= 0b00001;
        } else {
            raw &= !0b00001;
        }
        self.registers[CCR_INDEX].value = raw as f32;
    }
}

/// Signed fixed-point round-trip used by TSTNEG's bitwise complement; exposed for
/// completeness alongside the rest of the arithmetic helpers.
pub fn signed_complement(value: f32) -> f32 {
    int_to_float(!float_to_int(value))
}
