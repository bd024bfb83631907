//! Bnuuy: a small expression language compiled to bytecode and run on a stack VM.
//!
//! This is the library root that exports all modules.
//!
//! # Pipeline
//!
//! - **Scanner**: pulls tokens out of source text on demand
//! - **Compiler**: single-pass Pratt parser that emits bytecode directly
//! - **Chunk**: code bytes, constant pool and line table
//! - **VM**: fetch-decode-execute loop over a bounded operand stack
//! - **Disassembler**: read-only decoder used for dumps and traces

#![allow(clippy::module_inception)]

pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod repl;
pub mod repl_highlight;
pub mod span;
pub mod vm;

pub use bytecode::{Chunk, Value};
pub use compiler::compile;
pub use config::Config;
pub use error::{BnuuyError, CompileError, RuntimeError};
pub use vm::Vm;

/// Compile and run `source` on a fresh VM.
pub fn interpret(source: &str) -> Result<Value, BnuuyError> {
    Vm::new().interpret(source)
}

/// Render a full listing of `chunk`, headed by `== name ==`.
pub fn disassemble(chunk: &Chunk, name: &str) -> String {
    bytecode::disassemble_chunk(chunk, name)
}

/// Coarse result of compiling and running one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretOutcome {
    Ok,
    CompileError,
    RuntimeError,
}

impl InterpretOutcome {
    /// Classify a result. I/O failures are not produced by the core and are
    /// counted as runtime failures; use [`BnuuyError::exit_code`] for them.
    pub fn of<T>(result: &Result<T, BnuuyError>) -> Self {
        match result {
            Ok(_) => InterpretOutcome::Ok,
            Err(BnuuyError::Compile(_)) => InterpretOutcome::CompileError,
            Err(BnuuyError::Runtime(_) | BnuuyError::Io(_)) => InterpretOutcome::RuntimeError,
        }
    }

    /// Process exit code for this outcome: 0, 65 or 70.
    pub fn exit_code(self) -> i32 {
        match self {
            InterpretOutcome::Ok => 0,
            InterpretOutcome::CompileError => error::EXIT_COMPILE_ERROR,
            InterpretOutcome::RuntimeError => error::EXIT_RUNTIME_ERROR,
        }
    }
}
