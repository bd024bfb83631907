//! Bytecode representation for the Bnuuy VM.
//!
//! # Architecture
//!
//! - `instruction`: OpCode definitions and the structured decoder
//! - `value`: runtime values held in the constant pool and on the stack
//! - `chunk`: bytecode chunks with their constant pool and line table
//! - `disassembler`: debug output for bytecode inspection

pub mod chunk;
pub mod disassembler;
pub mod instruction;
pub mod value;

pub use chunk::{Chunk, LineRun, MAX_CONSTANTS};
pub use disassembler::{decode_chunk, decode_instruction, disassemble_chunk, disassemble_instruction};
pub use instruction::{Instruction, OpCode};
pub use value::Value;
