//! A small stack-machine backend for generator bodies: an assembler producing [`Program`]s, and
//! the interpreter that resumes them inside generator frames.

pub mod compiler;
pub mod indices;
mod interpreter;
#[cfg(test)]
pub mod test_utils;

pub use compiler::{Assembler, CompilerError, Constant, Label, Opcode, Program};
