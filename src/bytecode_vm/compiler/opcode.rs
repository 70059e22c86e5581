use std::fmt::{Display, Error, Formatter};

use crate::{
    bytecode_vm::indices::{ConstantIndex, LocalIndex},
    domain::ExceptionKind,
};

pub type Bytecode = Vec<Opcode>;

/// Jump distance, counted from the instruction after the jump. Negative offsets jump backwards.
pub type SignedOffset = isize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opcode {
    /// Push the value found at the specified index in the constant pool onto the stack.
    LoadConst(ConstantIndex),
    /// Read the local variable indicated by the specified index and push the value onto the stack.
    LoadFast(LocalIndex),
    /// Pop the top of the stack into the local variable indicated by the specified index.
    StoreFast(LocalIndex),
    /// Push the closure value the generator was created with.
    LoadClosure,
    /// Discard the top value on the stack.
    PopTop,
    /// Pop the top two values off the stack and push their sum. Works on ints and strings.
    Add,
    /// Pop the top two values off the stack and push their difference.
    Sub,
    /// Compare two values on the stack and push a boolean result back onto the stack based on
    /// whether the first value is less than the second value.
    LessThan,
    /// Unconditional jump to an offset. This is signed because you can jump in reverse.
    Jump(SignedOffset),
    /// Pop the top of the stack and jump if it is falsy.
    JumpIfFalse(SignedOffset),
    /// Pops the top value off the stack, constructs an iterator from it by `iter()`, and
    /// pushes the iterator.
    GetIter,
    /// Calls `next()` on the iterator on top of the stack. If a value is returned it is pushed
    /// above the iterator. If the iterator is exhausted, pops it and jumps by the given offset.
    ForIter(SignedOffset),
    /// Pop a value, then pop a list and append the value to it.
    ListAppend,
    /// Pop the top of the stack and suspend the frame, producing it. On resumption the value sent
    /// into the generator is pushed.
    YieldValue,
    /// Pop an iterable and delegate to its iterator until it is exhausted, forwarding sent values.
    /// The iterator's return value is pushed afterwards.
    YieldFrom,
    /// Install an exception handler at the given offset for the instructions that follow.
    SetupExcept(SignedOffset),
    /// Remove the most recently installed exception handler.
    PopBlock,
    /// Inside a handler, the raised exception is on top of the stack. Jump if it is not an
    /// instance of the given class, leaving the stack untouched.
    JumpIfNotExcMatch(ExceptionKind, SignedOffset),
    /// Pop an exception class or instance and raise it.
    Raise,
    /// Finish the frame, returning the top of the stack.
    ReturnValue,
}

impl Opcode {
    /// The same jump instruction aimed at a different offset. Other instructions are unchanged.
    pub fn with_offset(self, offset: SignedOffset) -> Self {
        match self {
            Opcode::Jump(_) => Opcode::Jump(offset),
            Opcode::JumpIfFalse(_) => Opcode::JumpIfFalse(offset),
            Opcode::ForIter(_) => Opcode::ForIter(offset),
            Opcode::SetupExcept(_) => Opcode::SetupExcept(offset),
            Opcode::JumpIfNotExcMatch(kind, _) => Opcode::JumpIfNotExcMatch(kind, offset),
            other => other,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Opcode::LoadConst(i) => write!(f, "LOAD_CONST {i}"),
            Opcode::LoadFast(i) => write!(f, "LOAD_FAST {i}"),
            Opcode::StoreFast(i) => write!(f, "STORE_FAST {i}"),
            Opcode::LoadClosure => write!(f, "LOAD_CLOSURE"),
            Opcode::PopTop => write!(f, "POP_TOP"),
            Opcode::Add => write!(f, "ADD"),
            Opcode::Sub => write!(f, "SUB"),
            Opcode::LessThan => write!(f, "LESS_THAN"),
            Opcode::Jump(i) => write!(f, "JUMP {i}"),
            Opcode::JumpIfFalse(i) => write!(f, "JUMP_IF_FALSE {i}"),
            Opcode::GetIter => write!(f, "GET_ITER"),
            Opcode::ForIter(i) => write!(f, "FOR_ITER {i}"),
            Opcode::ListAppend => write!(f, "LIST_APPEND"),
            Opcode::YieldValue => write!(f, "YIELD_VALUE"),
            Opcode::YieldFrom => write!(f, "YIELD_FROM"),
            Opcode::SetupExcept(i) => write!(f, "SETUP_EXCEPT {i}"),
            Opcode::PopBlock => write!(f, "POP_BLOCK"),
            Opcode::JumpIfNotExcMatch(kind, i) => write!(f, "JUMP_IF_NOT_EXC_MATCH {kind} {i}"),
            Opcode::Raise => write!(f, "RAISE"),
            Opcode::ReturnValue => write!(f, "RETURN_VALUE"),
        }
    }
}
