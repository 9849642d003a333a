// Error taxonomy surfaced by the parser. One variant per distinct failure the
// reference implementation's error map enumerates, each carrying the data needed
// to reproduce its message plus the source line it was found on.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DspError {
    /// The sentinel head entry every error list is seeded with. Not a real
    /// failure; a program is ready iff nothing beyond this entry exists.
    #[error("no error")]
    NoError,

    #[error("invalid input")]
    InvalidInput,

    #[error("division by zero")]
    DivisionByZero,

    #[error("'{name}' is already declared")]
    MultipleVarDeclare { name: String },

    #[error("'{token}' is not declared")]
    VarNotDeclared { token: String },

    #[error("input registers cannot be used as the R operand")]
    InputForRNotAllowed,

    #[error("program does not end with 'end'")]
    NoEndFound,

    #[error("I/O index {index} is out of range (channel count is {channel_count})")]
    IoIndexOutOfRange { index: u32, channel_count: u32 },

    #[error("'{text}' is not valid syntax")]
    SyntaxNotValid { text: String },

    #[error("iTRAM size {requested} exceeds the maximum of {max}")]
    ITramSizeTooLarge { requested: usize, max: usize },

    #[error("xTRAM size {requested} exceeds the maximum of {max}")]
    XTramSizeTooLarge { requested: usize, max: usize },
}

/// A parse error pinned to the source line it was raised on.
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    pub line: u32,
    pub error: DspError,
}

impl std::fmt::Display for LineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}
