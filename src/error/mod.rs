//! Error types for all phases.

use std::fmt;

use thiserror::Error;

/// Exit code for a usage error (bad command line).
pub const EXIT_USAGE: i32 = 64;
/// Exit code for a compile error.
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// Exit code for a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;
/// Exit code for an I/O failure.
pub const EXIT_IO_ERROR: i32 = 74;

/// Bytecode container errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("Too many constants in one chunk (limit {limit})")]
    TooManyConstants { limit: usize },

    #[error("Out of memory growing chunk to {requested} elements")]
    OutOfMemory { requested: usize },
}

/// Where a compile diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At the end of input.
    AtEnd,
    /// At a specific lexeme.
    At(String),
    /// The scanner already described the problem; no lexeme to show.
    Unlocated,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorLocation::AtEnd => write!(f, " at end"),
            ErrorLocation::At(lexeme) => write!(f, " at '{}'", lexeme),
            ErrorLocation::Unlocated => Ok(()),
        }
    }
}

/// A single reported compile diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub location: ErrorLocation,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, location: ErrorLocation, message: impl Into<String>) -> Self {
        Self {
            line,
            location,
            message: message.into(),
        }
    }
}

/// Bytecode compilation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{}", join_lines(.0))]
    Syntax(Vec<SyntaxError>),

    #[error("{0}")]
    Chunk(#[from] ChunkError),
}

impl CompileError {
    /// The reported diagnostics (empty for container failures).
    pub fn diagnostics(&self) -> &[SyntaxError] {
        match self {
            Self::Syntax(errors) => errors,
            Self::Chunk(_) => &[],
        }
    }
}

fn join_lines(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runtime errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("{message}\n[line {line}] in script")]
    TypeMismatch { message: String, line: usize },

    #[error("Stack overflow\n[line {line}] in script")]
    StackOverflow { line: usize },

    #[error("Stack underflow\n[line {line}] in script")]
    StackUnderflow { line: usize },

    #[error("Invalid opcode {byte} at offset {offset}")]
    InvalidOpcode { byte: u8, offset: usize },

    #[error("Invalid constant index {index} at offset {offset}")]
    InvalidConstant { index: u8, offset: usize },

    #[error("Truncated instruction at offset {offset}")]
    TruncatedInstruction { offset: usize },

    #[error("Execution ran past the end of the chunk at offset {offset}")]
    MissingReturn { offset: usize },
}

impl RuntimeError {
    pub fn type_mismatch(message: impl Into<String>, line: usize) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            line,
        }
    }

    /// Whether the error comes from a malformed chunk rather than the program.
    pub fn is_malformed_chunk(&self) -> bool {
        matches!(
            self,
            Self::InvalidOpcode { .. }
                | Self::InvalidConstant { .. }
                | Self::TruncatedInstruction { .. }
                | Self::MissingReturn { .. }
        )
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum BnuuyError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BnuuyError {
    /// The process exit code conventionally used for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Compile(_) => EXIT_COMPILE_ERROR,
            Self::Runtime(_) => EXIT_RUNTIME_ERROR,
            Self::Io(_) => EXIT_IO_ERROR,
        }
    }
}
