//! Bounded operand stack.

use thiserror::Error;

use crate::bytecode::Value;

/// Number of slots in the operand stack.
pub const STACK_MAX: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("Stack overflow")]
    Overflow,
    #[error("Stack underflow")]
    Underflow,
}

/// VM operand stack with a fixed capacity.
#[derive(Debug)]
pub struct Stack {
    values: Vec<Value>,
    max_size: usize,
}

impl Stack {
    /// Create new stack with maximum size
    pub fn new(max_size: usize) -> Self {
        Stack {
            values: Vec::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, value: Value) -> Result<(), StackError> {
        if self.values.len() >= self.max_size {
            return Err(StackError::Overflow);
        }
        self.values.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<Value, StackError> {
        self.values.pop().ok_or(StackError::Underflow)
    }

    /// Peek at top of stack without removing
    pub fn peek(&self) -> Result<Value, StackError> {
        self.values.last().copied().ok_or(StackError::Underflow)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Live values, bottom first.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for Stack {
    fn default() -> Self {
        Stack::new(STACK_MAX)
    }
}
