use std::{mem, ops::ControlFlow};

use crate::{
    domain::{DebugStackFrame, ToDebugStackFrame},
    runtime::{types::CodeObject, Exception, Traverse, Value},
};

/// `last_instruction` of a frame that has not run yet.
pub const FRAME_NOT_STARTED: isize = 0;

/// `last_instruction` of a frame that has returned or raised.
pub const FRAME_FINISHED: isize = -1;

/// An active exception handler: where to jump, and how deep the value stack was when the handler
/// was installed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlerBlock {
    pub handler: usize,
    pub stack_depth: usize,
}

/// The suspended execution state of a generator body.
#[derive(Debug)]
pub struct Frame {
    code: CodeObject,

    /// The resume point. Besides the two sentinels this is interpreted by the code object that
    /// owns the frame.
    pub last_instruction: isize,

    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
    pub blocks: Vec<HandlerBlock>,

    /// The iterator this frame is currently delegating to with `yield from`.
    pub yield_from: Option<Value>,

    /// An exception to raise at the resume point instead of continuing normally.
    pub previous_exception: Option<Exception>,

    generator_input: Option<Value>,
    delegation_result: Option<Value>,
}

impl Frame {
    pub fn new(code: CodeObject, args: Vec<Value>) -> Self {
        Self {
            code,
            last_instruction: FRAME_NOT_STARTED,
            locals: args,
            stack: vec![],
            blocks: vec![],
            yield_from: None,
            previous_exception: None,
            generator_input: None,
            delegation_result: None,
        }
    }

    pub fn code(&self) -> &CodeObject {
        &self.code
    }

    pub fn is_started(&self) -> bool {
        self.last_instruction != FRAME_NOT_STARTED
    }

    pub fn is_finished(&self) -> bool {
        self.last_instruction == FRAME_FINISHED
    }

    pub fn mark_finished(&mut self) {
        self.last_instruction = FRAME_FINISHED;
    }

    pub fn set_generator_input(&mut self, value: Value) {
        self.generator_input = Some(value);
    }

    /// The value sent into the generator for this resumption. Each value is seen once; a plain
    /// `next()` leaves `None` behind.
    pub fn take_generator_input(&mut self) -> Value {
        self.generator_input.take().unwrap_or_default()
    }

    /// The delegation target is exhausted with `result`. Step the resume point past the
    /// delegating instruction and keep the result for it to produce.
    pub fn finish_delegation(&mut self, result: Value) {
        self.yield_from = None;
        self.last_instruction += 1;
        self.delegation_result = Some(result);
    }

    pub fn take_delegation_result(&mut self) -> Value {
        mem::take(&mut self.delegation_result).unwrap_or_default()
    }
}

impl ToDebugStackFrame for Frame {
    fn to_stack_frame(&self) -> DebugStackFrame {
        DebugStackFrame::new(
            self.code.name(),
            self.code.filename(),
            self.last_instruction.max(0) as usize,
        )
    }
}

impl Traverse for Frame {
    fn traverse(&self, visit: &mut dyn FnMut(&Value) -> ControlFlow<()>) -> ControlFlow<()> {
        visit(&Value::Code(self.code.clone()))?;
        for value in self.locals.iter().chain(self.stack.iter()) {
            visit(value)?;
        }
        if let Some(yield_from) = &self.yield_from {
            visit(yield_from)?;
        }
        if let Some(input) = &self.generator_input {
            visit(input)?;
        }
        if let Some(result) = &self.delegation_result {
            visit(result)?;
        }
        ControlFlow::Continue(())
    }

    fn refers_directly_to(&self, object: &Value) -> bool {
        let mut found = false;
        let _ = self.traverse(&mut |value| {
            if value.same_identity(object) {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }
}
