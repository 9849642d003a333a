mod error;
mod fields;
mod instructions;
mod noise;
mod parser;
mod processor;
mod tables;
mod tram;

pub use error::{DspError, LineError};
pub use processor::Vm;

use std::collections::HashMap;
use tracing::{info, warn};

/// Configuration the host supplies before loading a program: how many audio
/// channels the I/O buffers carry.
pub struct Configuration {
    pub channel_count: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration { channel_count: 2 }
    }
}

/// The facade a host embeds: load a program, then drive it one frame at a time.
pub struct Dsp {
    channel_count: u32,
    vm: Option<Vm>,
    metadata: HashMap<String, String>,
    control_registers: Vec<String>,
    errors: Vec<LineError>,
}

impl Dsp {
    pub fn new(config: Configuration) -> Self {
        Dsp {
            channel_count: config.channel_count,
            vm: None,
            metadata: HashMap::new(),
            control_registers: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parses and lowers `source` into a running program. Returns `true` on
    /// success; on failure the facade stays not-ready and `errors()` explains why.
    pub fn load(&mut self, source: &str) -> bool {
        let program = parser::parse(source, self.channel_count);
        self.metadata = program.metadata.clone();
        self.control_registers = program.control_registers.clone();
        self.errors = program.errors.clone();

        if !program.is_ready() {
            for e in self.errors.iter().skip(1) {
                warn!(line = e.line, error = %e.error, "program failed to load");
            }
            self.vm = None;
            return false;
        }

        info!(
            registers = program.registers.len(),
            instructions = program.instructions.len(),
            "program loaded"
        );
        self.vm = Some(Vm::new(
            program.registers,
            program.instructions,
            program.itram_size,
            program.xtram_size,
            self.channel_count,
        ));
        true
    }

    pub fn process(&mut self, input_frame: &[f32]) -> Vec<f32> {
        match &mut self.vm {
            Some(vm) => vm.process(input_frame),
            None => vec![0.0; self.channel_count as usize],
        }
    }

    pub fn set_register(&mut self, name: &str, value: f32) -> bool {
        self.vm.as_mut().map(|vm| vm.set_register(name, value)).unwrap_or(false)
    }

    pub fn get_register(&self, name: &str) -> Option<f32> {
        self.vm.as_ref().and_then(|vm| vm.get_register(name))
    }

    pub fn get_control_registers(&self) -> &[String] {
        &self.control_registers
    }

    pub fn get_metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn set_channels(&mut self, channel_count: u32) {
        self.channel_count = channel_count;
        self.vm = None;
    }

    pub fn get_channels(&self) -> u32 {
        self.channel_count
    }

    pub fn is_ready(&self) -> bool {
        self.vm.is_some()
    }

    pub fn get_instruction_counter(&self) -> u64 {
        self.vm.as_ref().map(Vm::instruction_counter).unwrap_or(0)
    }

    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    /// Opts into indexing each of an instruction's INPUT operands by its own
    /// I/O channel rather than reproducing the reference implementation's
    /// substitution of A's channel for X and Y. A behavioral deviation, off by
    /// default.
    pub fn set_correct_input_indexing(&mut self, enabled: bool) {
        if let Some(vm) = &mut self.vm {
            vm.correct_input_indexing = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_surface_reports_out_of_range_io_index() {
        let mut dsp = Dsp::new(Configuration { channel_count: 2 });
        assert!(!dsp.load("output out 5\nend\n"));
        assert!(matches!(dsp.errors()[1].error, DspError::IoIndexOutOfRange { .. }));
        assert!(!dsp.is_ready());
    }

    #[test]
    fn successful_load_reaches_ready_state() {
        let mut dsp = Dsp::new(Configuration { channel_count: 1 });
        assert!(dsp.load("input in 0\noutput out 0\nmacs out, in, 0, 0\nend\n"));
        assert!(dsp.is_ready());
        assert_eq!(dsp.process(&[0.5]), vec![0.5]);
    }

    #[test]
    fn skip_bypasses_subsequent_instructions() {
        let mut dsp = Dsp::new(Configuration { channel_count: 1 });
        let src = "\
            input in 0\n\
            output out 0\n\
            static zero = 0\n\
            macs out, 0, 0, zero\n\
            skip out, 0, 8, 2\n\
            macs out, 1, 0, in\n\
            macs out, 1, 0, in\n\
            end\n";
        assert!(dsp.load(src), "{:?}", dsp.errors());
        let out = dsp.process(&[1.0]);
        // The first macs produces R=0, so CCR becomes Zero (0b01000 = 8), which
        // matches the skip's literal X operand, so it bypasses the next two
        // macs instructions; the output keeps the value the first macs set (0.0).
        assert_eq!(out[0], 0.0);
    }
}
