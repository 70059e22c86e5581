//! Python generator objects: resumable frames driven through `send`, `throw` and `close`, with
//! `yield from` delegation and finalization of abandoned generators.
//!
//! Generator bodies are anything implementing [`Executable`]. The [`bytecode_vm`] module provides
//! one such implementation.

pub mod bytecode_vm;
mod core;
mod domain;
mod errors;
mod runtime;

pub use bytecode_vm::{Assembler, CompilerError, Constant, Label, Opcode, Program};
pub use crate::core::Container;
pub use domain::{DebugCallStack, DebugStackFrame, ExceptionKind, ToDebugStackFrame, Type};
pub use errors::HostError;
pub use runtime::types::{
    CodeObject, Executable, Frame, FrameOutcome, Generator, GeneratorIterator, GeneratorState,
    HandlerBlock, FRAME_FINISHED, FRAME_NOT_STARTED,
};
pub use runtime::{
    close_iter, get_iter, referents, DepthGuard, Exception, Iterable, ListIterator, ThreadState,
    ThreadStateBuilder, Traceback, Traverse, Value, VmResult, DEFAULT_RECURSION_LIMIT,
};
