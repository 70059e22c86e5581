use std::{
    fmt::{Debug, Formatter},
    rc::Rc,
};

use crate::runtime::{
    types::{Frame, Generator},
    Exception, ThreadState, Value, VmResult,
};

/// How a single resumption of a frame ended.
#[derive(Debug, PartialEq)]
pub enum FrameOutcome {
    /// The frame suspended, producing a value. `last_instruction` is the resume point.
    Yielded(Value),
    /// The frame ran to completion. `last_instruction` is [`super::FRAME_FINISHED`].
    Returned(Value),
    /// The `yield from` target at `last_instruction` ran out, returning the value. The generator
    /// finishes the delegation and resumes the frame straight away.
    InnerExhausted(Value),
}

/// The body of a generator. An implementation resumes `frame` from `frame.last_instruction`,
/// raising `pending` at the resume point first when one is given.
///
/// Errors are exceptions escaping the frame, after which the frame is finished.
pub trait Executable {
    fn run(
        &self,
        state: &ThreadState,
        frame: &mut Frame,
        closure: &Value,
        pending: Option<Exception>,
    ) -> VmResult<FrameOutcome>;
}

struct FnExecutable<F>(F);

impl<F> Executable for FnExecutable<F>
where
    F: Fn(&ThreadState, &mut Frame, &Value, Option<Exception>) -> VmResult<FrameOutcome>,
{
    fn run(
        &self,
        state: &ThreadState,
        frame: &mut Frame,
        closure: &Value,
        pending: Option<Exception>,
    ) -> VmResult<FrameOutcome> {
        (self.0)(state, frame, closure, pending)
    }
}

struct CodeData {
    name: String,
    filename: String,
    executable: Box<dyn Executable>,
}

/// Immutable, shareable code. Every generator created from the same code object shares it.
#[derive(Clone)]
pub struct CodeObject(Rc<CodeData>);

impl CodeObject {
    pub fn new(name: &str, filename: &str, executable: impl Executable + 'static) -> Self {
        Self(Rc::new(CodeData {
            name: name.to_string(),
            filename: filename.to_string(),
            executable: Box::new(executable),
        }))
    }

    /// Code implemented directly in Rust, as a resumable state machine over the frame.
    pub fn from_fn<F>(name: &str, filename: &str, body: F) -> Self
    where
        F: Fn(&ThreadState, &mut Frame, &Value, Option<Exception>) -> VmResult<FrameOutcome>
            + 'static,
    {
        Self::new(name, filename, FnExecutable(body))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn filename(&self) -> &str {
        &self.0.filename
    }

    pub fn run(
        &self,
        state: &ThreadState,
        frame: &mut Frame,
        closure: &Value,
        pending: Option<Exception>,
    ) -> VmResult<FrameOutcome> {
        self.0.executable.run(state, frame, closure, pending)
    }

    /// Calling a generator function: bind the arguments into a fresh frame and wrap it.
    pub fn make_generator(&self, args: Vec<Value>, closure: Value) -> Rc<Generator> {
        Generator::new(Frame::new(self.clone(), args), closure)
    }

    pub fn same_identity(&self, other: &CodeObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn repr(&self) -> String {
        format!(
            "<code object {} at {:#x}, file \"{}\">",
            self.name(),
            self.address(),
            self.filename()
        )
    }
}

impl PartialEq for CodeObject {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Debug for CodeObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr())
    }
}
