// This is where the dirty grunt work of making sense of our textual input happens.
//
// Line-oriented, case-insensitive, comment-stripping. Every line is tried against
// a handful of patterns in order; the first to match wins. Errors are recorded
// with their line number and parsing continues, so a caller sees every mistake
// in one pass instead of only the first.

use crate::error::{DspError, LineError};
use crate::fields::{Gpr, RegisterType};
use crate::instructions::{Instruction, Opcode};
use crate::tram::{MAX_IDELAY_SIZE, MAX_XDELAY_SIZE};
use std::collections::HashMap;

pub const CCR_INDEX: usize = 0;
pub const READ_INDEX: usize = 1;
pub const WRITE_INDEX: usize = 2;
pub const AT_INDEX: usize = 3;

const METADATA_KEYS: [&str; 6] = ["name", "copyright", "created", "engine", "comment", "guid"];

pub struct ParsedProgram {
    pub registers: Vec<Gpr>,
    pub instructions: Vec<Instruction>,
    pub errors: Vec<LineError>,
    pub metadata: HashMap<String, String>,
    pub control_registers: Vec<String>,
    pub itram_size: usize,
    pub xtram_size: usize,
}

impl ParsedProgram {
    /// The error list always carries the "no error" sentinel as its head
    /// entry; a program is ready iff nothing was recorded beyond it.
    pub fn is_ready(&self) -> bool {
        self.errors.len() <= 1
    }
}

struct Parser {
    registers: Vec<Gpr>,
    names: HashMap<String, usize>,
    instructions: Vec<Instruction>,
    errors: Vec<LineError>,
    metadata: HashMap<String, String>,
    control_registers: Vec<String>,
    itram_size: usize,
    xtram_size: usize,
    channel_count: u32,
    saw_end: bool,
}

pub fn parse(source: &str, channel_count: u32) -> ParsedProgram {
    let mut parser = Parser {
        registers: Vec::new(),
        names: HashMap::new(),
        instructions: Vec::new(),
        errors: vec![LineError { line: 1, error: DspError::NoError }],
        metadata: HashMap::new(),
        control_registers: Vec::new(),
        itram_size: 0,
        xtram_size: 0,
        channel_count,
        saw_end: false,
    };
    parser.bootstrap_special_registers();

    for (line_no, raw_line) in source.lines().enumerate() {
        let line_no = line_no as u32 + 1;
        let stripped = strip_comment(raw_line).to_lowercase();
        parser.parse_line(&stripped, line_no);
    }

    if !parser.saw_end {
        parser.push_error(source.lines().count() as u32, DspError::NoEndFound);
    }

    ParsedProgram {
        registers: parser.registers,
        instructions: parser.instructions,
        errors: parser.errors,
        metadata: parser.metadata,
        control_registers: parser.control_registers,
        itram_size: parser.itram_size,
        xtram_size: parser.xtram_size,
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

impl Parser {
    fn bootstrap_special_registers(&mut self) {
        self.push_register(RegisterType::Ccr, "ccr");
        self.push_register(RegisterType::Read, "read");
        self.push_register(RegisterType::Write, "write");
        self.push_register(RegisterType::At, "at");
    }

    fn push_register(&mut self, reg_type: RegisterType, name: &str) -> usize {
        let index = self.registers.len();
        self.registers.push(Gpr::new(reg_type, name));
        self.names.insert(name.to_string(), index);
        index
    }

    fn push_error(&mut self, line: u32, error: DspError) {
        self.errors.push(LineError { line, error });
    }

    fn parse_line(&mut self, line: &str, line_no: u32) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let head = tokens[0];

        if let Some(reg_type) = RegisterType::from_keyword(head) {
            if reg_type.is_declarable() {
                return self.parse_declaration(reg_type, &tokens, line_no);
            }
        }
        if head == "itramsize" || head == "xtramsize" {
            return self.parse_tram_size(head, &tokens, line_no);
        }
        if head == "end" && tokens.len() == 1 {
            self.instructions.push(Instruction::end());
            self.saw_end = true;
            return;
        }
        if METADATA_KEYS.contains(&head) {
            return self.parse_metadata(head, trimmed, line_no);
        }
        if Opcode::from_keyword(head).is_some() {
            return self.parse_instruction(head, trimmed, line_no);
        }
        self.push_error(line_no, DspError::SyntaxNotValid { text: trimmed.to_string() });
    }

    fn parse_declaration(&mut self, reg_type: RegisterType, tokens: &[&str], line_no: u32) {
        if tokens.len() < 2 {
            self.push_error(line_no, DspError::SyntaxNotValid { text: tokens.join(" ") });
            return;
        }
        let name = tokens[1].trim_matches(|c| c == '=' || c == ',').to_string();
        let value_str: Option<&str> = tokens[2..]
            .iter()
            .map(|s| s.trim_matches(|c| c == '=' || c == ','))
            .find(|s| !s.is_empty());

        if self.names.contains_key(&name) {
            self.push_error(line_no, DspError::MultipleVarDeclare { name });
            return;
        }

        if matches!(reg_type, RegisterType::Control) {
            self.control_registers.push(name.clone());
        }

        let mut gpr = Gpr::new(reg_type, name.clone());
        if let Some(value_str) = value_str {
            match reg_type {
                RegisterType::Input | RegisterType::Output => {
                    let io_index: u32 = match value_str.parse() {
                        Ok(v) => v,
                        Err(_) => {
                            self.push_error(line_no, DspError::SyntaxNotValid { text: value_str.to_string() });
                            return;
                        }
                    };
                    if io_index >= self.channel_count {
                        self.push_error(
                            line_no,
                            DspError::IoIndexOutOfRange { index: io_index, channel_count: self.channel_count },
                        );
                        return;
                    }
                    gpr.io_index = io_index;
                }
                _ => {
                    if let Ok(v) = value_str.parse::<f32>() {
                        gpr.value = v;
                    }
                }
            }
        }
        let index = self.registers.len();
        self.registers.push(gpr);
        self.names.insert(name, index);
    }

    fn parse_tram_size(&mut self, keyword: &str, tokens: &[&str], line_no: u32) {
        let size: usize = match tokens.get(1).and_then(|s| s.parse().ok()) {
            Some(v) => v,
            None => {
                self.push_error(line_no, DspError::SyntaxNotValid { text: tokens.join(" ") });
                return;
            }
        };
        if keyword == "itramsize" {
            if size > MAX_IDELAY_SIZE {
                self.push_error(line_no, DspError::ITramSizeTooLarge { requested: size, max: MAX_IDELAY_SIZE });
                return;
            }
            self.itram_size = size;
        } else {
            if size > MAX_XDELAY_SIZE {
                self.push_error(line_no, DspError::XTramSizeTooLarge { requested: size, max: MAX_XDELAY_SIZE });
                return;
            }
            self.xtram_size = size;
        }
    }

    fn parse_metadata(&mut self, key: &str, line: &str, line_no: u32) {
        let rest = line[key.len()..].trim();
        let value = rest.trim_matches('"');
        if !rest.starts_with('"') || !rest.ends_with('"') || rest.len() < 2 {
            self.push_error(line_no, DspError::SyntaxNotValid { text: line.to_string() });
            return;
        }
        self.metadata.insert(key.to_string(), value.to_string());
    }

    fn parse_instruction(&mut self, keyword: &str, line: &str, line_no: u32) {
        let opcode = Opcode::from_keyword(keyword).expect("checked by caller");
        let operand_text = line[keyword.len()..].trim();
        let operands: Vec<&str> = operand_text.split(',').map(str::trim).collect();
        if operands.len() != 4 || operands.iter().any(|o| o.is_empty()) {
            self.push_error(line_no, DspError::SyntaxNotValid { text: line.to_string() });
            return;
        }

        let r = match self.resolve_operand(operands[0], line_no) {
            Some(i) => i,
            None => return,
        };
        if self.registers[r].reg_type == RegisterType::Input {
            self.push_error(line_no, DspError::InputForRNotAllowed);
            return;
        }
        let has_output = self.registers[r].reg_type == RegisterType::Output;

        let a = match self.resolve_operand(operands[1], line_no) {
            Some(i) => i,
            None => return,
        };
        let x = match self.resolve_operand(operands[2], line_no) {
            Some(i) => i,
            None => return,
        };
        let y = match self.resolve_operand(operands[3], line_no) {
            Some(i) => i,
            None => return,
        };

        let has_input = [a, x, y].iter().any(|&i| self.registers[i].reg_type == RegisterType::Input);
        let has_noise = [a, x, y].iter().any(|&i| self.registers[i].name == "noise");

        self.instructions.push(Instruction {
            opcode,
            r,
            a,
            x,
            y,
            has_input,
            has_output,
            has_noise,
        });
    }

    /// Resolves an operand token to a register index, materializing an anonymous
    /// STATIC register for bare numeric literals.
    fn resolve_operand(&mut self, token: &str, line_no: u32) -> Option<usize> {
        if let Some(&index) = self.names.get(token) {
            return Some(index);
        }
        if let Ok(value) = token.parse::<f32>() {
            let index = self.registers.len();
            let mut gpr = Gpr::new(RegisterType::Static, token);
            gpr.value = value;
            self.registers.push(gpr);
            self.names.insert(token.to_string(), index);
            return Some(index);
        }
        self.push_error(line_no, DspError::VarNotDeclared { token: token.to_string() });
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_program_parses_clean() {
        let src = "input in 0\noutput out 0\nmacs out, 0, 0, in\nend\n";
        let program = parse(src, 1);
        assert!(program.is_ready(), "{:?}", program.errors);
        assert_eq!(program.instructions.len(), 1);
    }

    #[test]
    fn comments_do_not_shift_line_numbers() {
        let src = "; a comment\ninput in 0\noutput out 5\nmacs out, 0, 0, in\nend\n";
        let program = parse(src, 2);
        assert!(!program.is_ready());
        assert_eq!(program.errors[1].line, 3);
    }

    #[test]
    fn redeclaration_is_an_error() {
        let src = "static a = 1\nstatic a = 2\nend\n";
        let program = parse(src, 1);
        assert!(matches!(program.errors[1].error, DspError::MultipleVarDeclare { .. }));
    }

    #[test]
    fn missing_end_is_reported() {
        let src = "static a = 1\n";
        let program = parse(src, 1);
        assert!(program.errors.iter().any(|e| matches!(e.error, DspError::NoEndFound)));
    }

    #[test]
    fn output_index_out_of_range_is_reported() {
        let src = "output out 5\nend\n";
        let program = parse(src, 2);
        assert!(program.errors.iter().any(|e| matches!(e.error, DspError::IoIndexOutOfRange { .. })));
    }

    #[test]
    fn tram_size_directives_are_recorded() {
        let src = "itramsize 4\nxtramsize 16\nend\n";
        let program = parse(src, 1);
        assert!(program.is_ready());
        assert_eq!(program.itram_size, 4);
        assert_eq!(program.xtram_size, 16);
    }

    #[test]
    fn metadata_lines_populate_the_map() {
        let src = "name \"patch\"\nend\n";
        let program = parse(src, 1);
        assert_eq!(program.metadata.get("name").unwrap(), "patch");
    }

    #[test]
    fn input_as_r_operand_is_rejected() {
        let src = "input in 0\nmacs in, 0, 0, in\nend\n";
        let program = parse(src, 1);
        assert!(program.errors.iter().any(|e| matches!(e.error, DspError::InputForRNotAllowed)));
    }
}
