//! Bytecode chunk containing instructions, constants and line information.

use crate::bytecode::instruction::OpCode;
use crate::bytecode::value::Value;
use crate::error::ChunkError;

/// Maximum number of constants addressable by a one-byte operand.
pub const MAX_CONSTANTS: usize = u8::MAX as usize + 1;

/// Capacity of the first allocation; later growth doubles.
const MIN_CAPACITY: usize = 8;

/// A run of consecutive code bytes emitted for the same source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRun {
    pub line: usize,
    pub len: usize,
}

/// A chunk of bytecode: code bytes, constant pool and a line table.
///
/// Chunks are append-only. The compiler fills one and hands it, read-only, to
/// the VM and the disassembler.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    code: Vec<u8>,
    constants: Vec<Value>,
    lines: Vec<LineRun>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw byte to the chunk.
    ///
    /// Both the code buffer and the line table are grown before either is
    /// touched, so a failed write leaves the chunk unchanged.
    pub fn write(&mut self, byte: u8, line: usize) -> Result<(), ChunkError> {
        grow_for_push(&mut self.code)?;
        if !self.extends_last_run(line) {
            grow_for_push(&mut self.lines)?;
        }
        self.code.push(byte);
        self.record_line(line);
        Ok(())
    }

    /// Write an opcode to the chunk.
    pub fn write_op(&mut self, op: OpCode, line: usize) -> Result<(), ChunkError> {
        self.write(op.into(), line)
    }

    /// Add a constant to the pool and return its index.
    ///
    /// Constants are never deduplicated: the N-th call returns index N-1.
    pub fn add_constant(&mut self, value: Value) -> Result<u8, ChunkError> {
        let index = u8::try_from(self.constants.len()).map_err(|_| {
            ChunkError::TooManyConstants {
                limit: MAX_CONSTANTS,
            }
        })?;
        grow_for_push(&mut self.constants)?;
        self.constants.push(value);
        Ok(index)
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn constant(&self, index: u8) -> Option<Value> {
        self.constants.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Allocated capacity of the code buffer, in bytes.
    pub fn capacity(&self) -> usize {
        self.code.capacity()
    }

    /// The run-length encoded line table.
    pub fn line_runs(&self) -> &[LineRun] {
        &self.lines
    }

    /// Get the source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<usize> {
        let mut end = 0;
        for run in &self.lines {
            end += run.len;
            if offset < end {
                return Some(run.line);
            }
        }
        None
    }

    fn extends_last_run(&self, line: usize) -> bool {
        matches!(self.lines.last(), Some(run) if run.line == line)
    }

    /// Callers must have made room in `lines` for a new run.
    fn record_line(&mut self, line: usize) {
        match self.lines.last_mut() {
            Some(run) if run.line == line => run.len += 1,
            _ => self.lines.push(LineRun { line, len: 1 }),
        }
    }
}

/// Make room for one more element, doubling the allocation when full.
fn grow_for_push<T>(buffer: &mut Vec<T>) -> Result<(), ChunkError> {
    if buffer.len() < buffer.capacity() {
        return Ok(());
    }
    let requested = if buffer.capacity() < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        buffer.capacity() * 2
    };
    buffer
        .try_reserve_exact(requested - buffer.len())
        .map_err(|_| ChunkError::OutOfMemory { requested })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_basics() {
        let mut chunk = Chunk::new();
        let idx = chunk.add_constant(Value::Number(1.2)).unwrap();
        chunk.write_op(OpCode::Constant, 1).unwrap();
        chunk.write(idx, 1).unwrap();
        chunk.write_op(OpCode::Return, 1).unwrap();

        assert_eq!(chunk.code(), &[6, 0, 7]);
        assert_eq!(chunk.constant(0), Some(Value::Number(1.2)));
        assert_eq!(chunk.constant(1), None);
    }

    #[test]
    fn test_constant_pool_is_positional() {
        let mut chunk = Chunk::new();
        let a = chunk.add_constant(Value::Number(42.0)).unwrap();
        let b = chunk.add_constant(Value::Number(42.0)).unwrap();
        let c = chunk.add_constant(Value::Nil).unwrap();

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(chunk.constants().len(), 3);
    }

    #[test]
    fn test_constant_pool_limit() {
        let mut chunk = Chunk::new();
        for i in 0..MAX_CONSTANTS {
            assert_eq!(chunk.add_constant(Value::Number(i as f64)).unwrap() as usize, i);
        }
        assert_eq!(
            chunk.add_constant(Value::Number(0.0)),
            Err(ChunkError::TooManyConstants { limit: 256 })
        );
        assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
    }

    #[test]
    fn test_growth_is_monotonic_and_sufficient() {
        let mut chunk = Chunk::new();
        let mut last_capacity = chunk.capacity();
        for n in 1..=1000usize {
            chunk.write((n % 256) as u8, 1).unwrap();
            assert_eq!(chunk.len(), n);
            assert!(chunk.capacity() >= n);
            assert!(chunk.capacity() >= last_capacity);
            last_capacity = chunk.capacity();
        }
    }

    #[test]
    fn test_first_growth_uses_minimum_capacity() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Return, 1).unwrap();
        assert!(chunk.capacity() >= MIN_CAPACITY);
    }

    #[test]
    fn test_line_table_is_run_length_encoded() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1).unwrap();
        chunk.write(0, 1).unwrap();
        chunk.write_op(OpCode::Negate, 3).unwrap();
        chunk.write_op(OpCode::Return, 300).unwrap();

        assert_eq!(
            chunk.line_runs(),
            &[
                LineRun { line: 1, len: 2 },
                LineRun { line: 3, len: 1 },
                LineRun { line: 300, len: 1 },
            ]
        );
        assert_eq!(chunk.line_at(0), Some(1));
        assert_eq!(chunk.line_at(1), Some(1));
        assert_eq!(chunk.line_at(2), Some(3));
        assert_eq!(chunk.line_at(3), Some(300));
        assert_eq!(chunk.line_at(4), None);
    }

    #[test]
    fn test_line_table_grows_with_every_new_line() {
        let mut chunk = Chunk::new();
        let mut last_capacity = chunk.lines.capacity();
        for line in 1..=1000usize {
            chunk.write_op(OpCode::Negate, line).unwrap();
            assert_eq!(chunk.line_runs().len(), line);
            assert!(chunk.lines.capacity() >= last_capacity);
            last_capacity = chunk.lines.capacity();
        }
        assert!(last_capacity >= MIN_CAPACITY);
        assert_eq!(chunk.line_at(0), Some(1));
        assert_eq!(chunk.line_at(499), Some(500));
        assert_eq!(chunk.line_at(999), Some(1000));
        assert_eq!(chunk.line_at(1000), None);
    }
}
