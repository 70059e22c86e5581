mod call_stack;
mod error;
mod stack_frame;
mod type_enum;

pub use call_stack::DebugCallStack;
#[cfg(test)]
pub use error::test_utils;
pub use error::ExceptionKind;
pub use stack_frame::{DebugStackFrame, ToDebugStackFrame};
pub use type_enum::Type;
