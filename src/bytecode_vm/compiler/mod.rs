mod assembler;
mod constant;
mod error;
mod opcode;
mod program;

pub use assembler::{Assembler, Label};
pub use constant::Constant;
pub use error::CompilerError;
pub use opcode::{Bytecode, Opcode, SignedOffset};
pub use program::Program;
