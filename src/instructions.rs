// The FX8010 opcode set and its per-instruction execution semantics.
//
// Every opcode that produces a value in R also writes the raw, unsaturated result
// into the interpreter's accumulator and then recomputes CCR from the final value
// of R, exactly mirroring the reference implementation's switch statement.

use crate::processor::Vm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Macs,
    Macsn,
    Macw,
    Macwn,
    Macints,
    Macintw,
    Acc3,
    Macmv,
    Andxor,
    Tstneg,
    Limit,
    Limitn,
    Log,
    Exp,
    Interp,
    Skip,
    Idelay,
    Xdelay,
    End,
}

impl Opcode {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "macs" => Self::Macs,
            "macsn" => Self::Macsn,
            "macw" => Self::Macw,
            "macwn" => Self::Macwn,
            "macints" => Self::Macints,
            "macintw" => Self::Macintw,
            "acc3" => Self::Acc3,
            "macmv" => Self::Macmv,
            "andxor" => Self::Andxor,
            "tstneg" => Self::Tstneg,
            "limit" => Self::Limit,
            "limitn" => Self::Limitn,
            "log" => Self::Log,
            "exp" => Self::Exp,
            "interp" => Self::Interp,
            "skip" => Self::Skip,
            "idelay" => Self::Idelay,
            "xdelay" => Self::Xdelay,
            _ => return None,
        })
    }
}

/// One decoded line of a loaded program: an opcode plus four register-file indices.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    pub r: usize,
    pub a: usize,
    pub x: usize,
    pub y: usize,
    pub has_input: bool,
    pub has_output: bool,
    pub has_noise: bool,
}

impl Instruction {
    pub fn end() -> Self {
        Instruction {
            opcode: Opcode::End,
            r: 0,
            a: 0,
            x: 0,
            y: 0,
            has_input: false,
            has_output: false,
            has_noise: false,
        }
    }

    /// Runs this instruction against the interpreter's register file and delay
    /// lines. Returns `true` if END was reached.
    pub fn execute(&self, vm: &mut Vm) -> bool {
        use crate::fields::{logic_ops, saturate, wrap_around};

        let a = vm.registers[self.a].value;
        let x = vm.registers[self.x].value;
        let y = vm.registers[self.y].value;

        match self.opcode {
            Opcode::Macs => {
                let raw = a + x * y;
                vm.accumulator = raw as f64;
                self.write_r(vm, saturate(raw, 1.0));
            }
            Opcode::Macsn => {
                let raw = a - x * y;
                vm.accumulator = raw as f64;
                self.write_r(vm, saturate(raw, 1.0));
            }
            Opcode::Macints => {
                let raw = a + x * y;
                vm.accumulator = raw as f64;
                self.write_r(vm, saturate(raw, 1.0));
            }
            Opcode::Acc3 => {
                let raw = a + x + y;
                vm.accumulator = raw as f64;
                self.write_r(vm, saturate(raw, 1.0));
            }
            Opcode::Macw => {
                let (wrapped, borrow) = wrap_around(x * y);
                vm.set_borrow(borrow);
                let raw = a + wrapped;
                vm.accumulator = raw as f64;
                self.write_r(vm, raw);
            }
            Opcode::Macwn => {
                let (wrapped, borrow) = wrap_around(x * y);
                vm.set_borrow(borrow);
                let raw = a - wrapped;
                vm.accumulator = raw as f64;
                self.write_r(vm, raw);
            }
            Opcode::Macintw => {
                let (wrapped, borrow) = wrap_around(a + x * y);
                vm.set_borrow(borrow);
                vm.accumulator = wrapped as f64;
                self.write_r(vm, wrapped);
            }
            Opcode::Macmv => {
                vm.accumulator += (x * y) as f64;
                self.write_r(vm, a);
            }
            Opcode::Andxor => {
                let raw = logic_ops(a, x, y) as f32;
                self.write_r(vm, raw);
            }
            Opcode::Tstneg => {
                let raw = if a >= y { x } else { crate::fields::int_to_float(!crate::fields::float_to_int(x)) };
                vm.accumulator = raw as f64;
                self.write_r(vm, raw);
            }
            Opcode::Limit => {
                let raw = if a >= y { x } else { y };
                vm.accumulator = raw as f64;
                self.write_r(vm, raw);
            }
            Opcode::Limitn => {
                let raw = if a < y { x } else { y };
                vm.accumulator = raw as f64;
                self.write_r(vm, raw);
            }
            Opcode::Log => {
                let table = vm.log_tables.table(x as usize).unwrap_or(&[]);
                let raw = if table.is_empty() {
                    0.0
                } else {
                    crate::tables::interpolate(a as f64, table, -1.0, 1.0) as f32
                };
                vm.accumulator = raw as f64;
                self.write_r_unsaturated(vm, raw);
            }
            Opcode::Exp => {
                let table = vm.exp_tables.table(x as usize).unwrap_or(&[]);
                let raw = if table.is_empty() {
                    0.0
                } else {
                    crate::tables::interpolate(a as f64, table, -1.0, 1.0) as f32
                };
                vm.accumulator = raw as f64;
                self.write_r_unsaturated(vm, raw);
            }
            Opcode::Interp => {
                let raw = (1.0 - x) * a + x * y;
                vm.accumulator = raw as f64;
                self.write_r(vm, saturate(raw, 1.0));
            }
            Opcode::Skip => {
                if x as i32 == vm.ccr_raw() {
                    vm.skip_counter = y as i32;
                }
            }
            Opcode::Idelay => self.run_delay(vm, true),
            Opcode::Xdelay => self.run_delay(vm, false),
            Opcode::End => return true,
        }
        false
    }

    fn run_delay(&self, vm: &mut Vm, small: bool) {
        use crate::fields::RegisterType;
        let r_type = vm.registers[self.r].reg_type;
        let offset = vm.registers[self.y].value as i32;
        match r_type {
            RegisterType::Read => {
                let sample = if small {
                    vm.i_tram.read(offset)
                } else {
                    vm.x_tram.read(offset)
                };
                vm.registers[self.a].value = sample;
            }
            RegisterType::Write => {
                let sample = vm.registers[self.a].value;
                if small {
                    vm.i_tram.write(sample, offset);
                } else {
                    vm.x_tram.write(sample, offset);
                }
            }
            _ => {}
        }
    }

    fn write_r(&self, vm: &mut Vm, value: f32) {
        vm.registers[self.r].value = value;
        vm.update_ccr(value);
    }

    /// Used by LOG/EXP, which never saturate but still update CCR from R.
    fn write_r_unsaturated(&self, vm: &mut Vm, value: f32) {
        self.write_r(vm, value)
    }
}
