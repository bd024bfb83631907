//! Bytecode disassembler for debugging.

use std::fmt::{self, Write};

use crate::bytecode::chunk::Chunk;
use crate::bytecode::instruction::Instruction;

/// Decode the instruction at `offset`, or `None` past the end of the code.
pub fn decode_instruction(chunk: &Chunk, offset: usize) -> Option<Instruction> {
    Instruction::decode(chunk.code(), offset)
}

/// Decode a whole chunk into `(offset, instruction)` pairs.
///
/// Malformed bytes decode as [`Instruction::Unknown`] or
/// [`Instruction::Truncated`] and decoding carries on after them.
pub fn decode_chunk(chunk: &Chunk) -> Vec<(usize, Instruction)> {
    let mut decoded = Vec::new();
    let mut offset = 0;
    while let Some(instruction) = decode_instruction(chunk, offset) {
        decoded.push((offset, instruction));
        offset += instruction.size();
    }
    decoded
}

/// Disassemble a chunk into human-readable output, headed by `== name ==`.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail.
    let _ = write_chunk(chunk, name, &mut output);
    output
}

/// Disassemble a single instruction into `output` and return the next offset.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, output: &mut String) -> usize {
    match write_instruction(chunk, offset, output) {
        Ok(next) => next,
        Err(_) => offset + 1,
    }
}

fn write_chunk(chunk: &Chunk, name: &str, output: &mut impl Write) -> fmt::Result {
    writeln!(output, "== {} ==", name)?;
    let mut offset = 0;
    while offset < chunk.len() {
        offset = write_instruction(chunk, offset, output)?;
    }
    Ok(())
}

fn write_instruction(chunk: &Chunk, offset: usize, output: &mut impl Write) -> Result<usize, fmt::Error> {
    let Some(instruction) = decode_instruction(chunk, offset) else {
        return Ok(offset + 1);
    };

    write!(output, "{:04} ", offset)?;

    // Line number (or | if same as previous)
    let line = chunk.line_at(offset);
    if offset > 0 && line == chunk.line_at(offset - 1) {
        write!(output, "   | ")?;
    } else {
        match line {
            Some(line) => write!(output, "{:4} ", line)?,
            None => write!(output, "   ? ")?,
        }
    }

    match instruction {
        Instruction::Constant { index } => {
            let mnemonic = mnemonic(&instruction);
            match chunk.constant(index) {
                Some(value) => writeln!(output, "{:<16} {:4} '{}'", mnemonic, index, value)?,
                None => writeln!(output, "{:<16} {:4} <invalid>", mnemonic, index)?,
            }
        }
        Instruction::UpdateLine { line } => {
            writeln!(output, "{:<16} {:4}", mnemonic(&instruction), line)?;
        }
        Instruction::Unknown(byte) => writeln!(output, "Unknown opcode {}", byte)?,
        Instruction::Truncated(op) => {
            writeln!(output, "{:<16} <missing operand>", op.mnemonic())?;
        }
        _ => writeln!(output, "{}", mnemonic(&instruction))?,
    }

    Ok(offset + instruction.size())
}

fn mnemonic(instruction: &Instruction) -> &'static str {
    instruction.opcode().map_or("OP_UNKNOWN", |op| op.mnemonic())
}
