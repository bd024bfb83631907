//! Stack-based virtual machine for Bnuuy bytecode.

pub mod stack;
#[allow(clippy::module_inception)]
pub mod vm;

pub use stack::{Stack, StackError, STACK_MAX};
pub use vm::Vm;
