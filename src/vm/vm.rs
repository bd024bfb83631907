//! The bytecode virtual machine: a stack-based fetch-decode-execute loop.

use std::io::{self, Write};

use tracing::{debug, trace, warn};

use crate::bytecode::{disassemble_chunk, disassemble_instruction, Chunk, OpCode, Value};
use crate::compiler;
use crate::config::Config;
use crate::error::{BnuuyError, RuntimeError};

use super::stack::{Stack, StackError};

/// The bytecode VM.
///
/// One VM can run any number of chunks in turn. The operand stack is emptied
/// after every run, whether it succeeded or not.
pub struct Vm {
    stack: Stack,
    /// Offset of the next byte to fetch.
    ip: usize,
    /// Line set by the last UPDATE_LINE executed.
    line: usize,
    config: Config,
    /// Destination for chunk dumps and execution traces.
    debug_output: Box<dyn Write>,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            stack: Stack::default(),
            ip: 0,
            line: 0,
            config,
            debug_output: Box::new(io::stdout()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Redirect chunk dumps and traces (stdout by default).
    pub fn set_debug_output(&mut self, output: Box<dyn Write>) {
        self.debug_output = output;
    }

    /// Compile `source` into a fresh chunk and run it.
    pub fn interpret(&mut self, source: &str) -> Result<Value, BnuuyError> {
        let chunk = compiler::compile(source)?;
        if self.config.print_code {
            let listing = disassemble_chunk(&chunk, "code");
            self.write_debug(&listing);
        }
        Ok(self.run(&chunk)?)
    }

    /// Execute a chunk until RETURN and surface the returned value.
    pub fn run(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        self.ip = 0;
        self.line = 0;
        debug!(bytes = chunk.len(), "vm run started");

        let result = self.execute(chunk);
        self.stack.clear();

        match &result {
            Ok(value) => debug!(%value, "vm run finished"),
            Err(e) if e.is_malformed_chunk() => warn!(error = %e, "malformed chunk"),
            Err(e) => debug!(error = %e, "runtime error"),
        }
        result
    }

    /// Number of live values on the operand stack.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn execute(&mut self, chunk: &Chunk) -> Result<Value, RuntimeError> {
        loop {
            if self.config.trace_execution {
                self.trace_instruction(chunk);
            }

            let offset = self.ip;
            let Some(&byte) = chunk.code().get(offset) else {
                return Err(RuntimeError::MissingReturn { offset });
            };
            self.ip += 1;

            let Some(op) = OpCode::from_u8(byte) else {
                return Err(RuntimeError::InvalidOpcode { byte, offset });
            };
            trace!(offset, op = op.mnemonic(), "dispatch");

            match op {
                OpCode::Add => self.binary_op(chunk, offset, |a, b| a + b)?,
                OpCode::Subtract => self.binary_op(chunk, offset, |a, b| a - b)?,
                OpCode::Multiply => self.binary_op(chunk, offset, |a, b| a * b)?,
                OpCode::Divide => self.binary_op(chunk, offset, |a, b| a / b)?,

                OpCode::Negate => {
                    let line = self.line_of(chunk, offset);
                    let operand = self.stack.peek().map_err(|e| stack_error(e, line))?;
                    let Some(n) = operand.as_number() else {
                        return Err(RuntimeError::type_mismatch("Operand must be a number.", line));
                    };
                    self.pop(chunk, offset)?;
                    self.push(chunk, offset, Value::Number(-n))?;
                }

                OpCode::Constant => {
                    let index = self.read_byte(chunk, offset)?;
                    let value = chunk
                        .constant(index)
                        .ok_or(RuntimeError::InvalidConstant { index, offset })?;
                    self.push(chunk, offset, value)?;
                }

                OpCode::UpdateLine => {
                    self.line = self.read_byte(chunk, offset)? as usize;
                }

                OpCode::Return => return self.pop(chunk, offset),
            }
        }
    }

    /// Pop the right operand, then the left, and push `f(left, right)`.
    fn binary_op(
        &mut self,
        chunk: &Chunk,
        offset: usize,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<(), RuntimeError> {
        let right = self.pop(chunk, offset)?;
        let left = self.pop(chunk, offset)?;
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => self.push(chunk, offset, Value::Number(f(a, b))),
            _ => Err(RuntimeError::type_mismatch(
                "Operands must be numbers.",
                self.line_of(chunk, offset),
            )),
        }
    }

    fn read_byte(&mut self, chunk: &Chunk, offset: usize) -> Result<u8, RuntimeError> {
        let byte = chunk
            .code()
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::TruncatedInstruction { offset })?;
        self.ip += 1;
        Ok(byte)
    }

    fn push(&mut self, chunk: &Chunk, offset: usize, value: Value) -> Result<(), RuntimeError> {
        self.stack
            .push(value)
            .map_err(|e| stack_error(e, self.line_of(chunk, offset)))
    }

    fn pop(&mut self, chunk: &Chunk, offset: usize) -> Result<Value, RuntimeError> {
        self.stack
            .pop()
            .map_err(|e| stack_error(e, self.line_of(chunk, offset)))
    }

    /// Source line of the instruction at `offset`.
    fn line_of(&self, chunk: &Chunk, offset: usize) -> usize {
        chunk.line_at(offset).unwrap_or(self.line)
    }

    fn trace_instruction(&mut self, chunk: &Chunk) {
        let mut text = String::from("          ");
        for value in self.stack.as_slice() {
            text.push_str(&format!("[ {} ]", value));
        }
        text.push('\n');
        if self.ip < chunk.len() {
            disassemble_instruction(chunk, self.ip, &mut text);
        }
        self.write_debug(&text);
    }

    fn write_debug(&mut self, text: &str) {
        if let Err(e) = self.debug_output.write_all(text.as_bytes()) {
            warn!(error = %e, "failed to write debug output");
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

fn stack_error(error: StackError, line: usize) -> RuntimeError {
    match error {
        StackError::Overflow => RuntimeError::StackOverflow { line },
        StackError::Underflow => RuntimeError::StackUnderflow { line },
    }
}
