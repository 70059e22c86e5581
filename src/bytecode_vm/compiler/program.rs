use std::fmt::{Debug, Error, Formatter};

use crate::bytecode_vm::compiler::{Bytecode, Constant};

/// Assembled bytecode for one generator body. This is immutable and does not know about the frame
/// it runs in; locals, the value stack and the resume point all live in the frame.
#[derive(Clone, PartialEq)]
pub struct Program {
    pub bytecode: Bytecode,
    /// Local variable names. The first `arg_count` are bound from the call arguments.
    pub varnames: Vec<String>,
    pub arg_count: usize,
    pub constants: Vec<Constant>,
}

impl Program {
    pub fn varname(&self, index: usize) -> &str {
        self.varnames
            .get(index)
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        writeln!(f, "varnames:")?;
        for (index, name) in self.varnames.iter().enumerate() {
            writeln!(f, "[{index}]: {name}")?;
        }

        writeln!(f, "\nconstants:")?;
        for (index, constant) in self.constants.iter().enumerate() {
            writeln!(f, "[{index}]: {constant}")?;
        }

        writeln!(f, "\nbytecode:")?;
        for (index, opcode) in self.bytecode.iter().enumerate() {
            writeln!(f, "{index}: {opcode}")?;
        }

        Ok(())
    }
}
