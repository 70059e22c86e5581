use std::{
    cell::{Cell, RefCell},
    fmt::{Debug, Formatter},
    ops::ControlFlow,
    panic::{self, AssertUnwindSafe},
    rc::Rc,
    thread,
};

use tracing::{debug, trace, warn};

use crate::{
    core::Container,
    domain::ExceptionKind,
    runtime::{
        close_iter,
        types::{CodeObject, Frame, FrameOutcome},
        Exception, ThreadState, Traceback, Traverse, Value, VmResult,
    },
};

/// Where a generator is in its lifecycle, as reported by `inspect.getgeneratorstate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Created,
    Suspended,
    /// Suspended inside a `yield from`.
    Delegating,
    Running,
    Finished,
}

/// Marks the generator as executing for as long as it lives. Dropping clears the flag on every
/// exit path, including panics.
struct RunningGuard<'a>(&'a Cell<bool>);

impl<'a> RunningGuard<'a> {
    fn new(running: &'a Cell<bool>) -> Self {
        running.set(true);
        Self(running)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A suspended generator body. The frame is dropped once the body returns or raises, which is
/// also how a finished generator is recognised.
pub struct Generator {
    frame: RefCell<Option<Container<Frame>>>,
    code: CodeObject,
    closure: Value,
    running: Cell<bool>,
}

impl Generator {
    pub fn new(frame: Frame, closure: Value) -> Rc<Self> {
        let code = frame.code().clone();
        Rc::new(Self {
            frame: RefCell::new(Some(Container::new(frame))),
            code,
            closure,
            running: Cell::new(false),
        })
    }

    fn frame(&self) -> Option<Container<Frame>> {
        self.frame.borrow().clone()
    }

    fn already_executing() -> Exception {
        Exception::value_error("generator already executing")
    }

    /// Resume the body, delivering `value` as the result of the `yield` it is suspended at.
    pub fn send(&self, value: Value) -> VmResult<Value> {
        let Some(frame) = self.frame() else {
            return Err(Exception::stop_iteration());
        };
        // A running frame is mutably borrowed; `advance` reports that case.
        let just_started = frame
            .try_borrow()
            .map(|frame| !frame.is_started())
            .unwrap_or(false);
        if just_started && !value.is_none() {
            return Err(Exception::type_error(
                "can't send non-None value to a just-started generator",
            ));
        }

        self.advance(&ThreadState::current(), Some(value))
    }

    pub fn next(&self) -> VmResult<Value> {
        self.advance(&ThreadState::current(), None)
    }

    /// The iterator-protocol step: like [`Generator::next`], but exhaustion is `Ok(None)`.
    pub fn dunder_next(&self) -> VmResult<Option<Value>> {
        match self.next() {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ExceptionKind::StopIteration => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// A generator is its own iterator.
    pub fn iter(self: &Rc<Self>) -> Rc<Self> {
        self.clone()
    }

    fn advance(&self, state: &ThreadState, arg: Option<Value>) -> VmResult<Value> {
        if self.running.get() {
            return Err(Self::already_executing());
        }
        let Some(frame) = self.frame() else {
            return Err(Exception::stop_iteration());
        };
        let _depth = state.enter()?;

        let pending = frame.borrow_mut().previous_exception.take();
        if frame.borrow().is_finished() {
            self.terminate();
            return Err(Exception::stop_iteration());
        }
        if let Some(value) = arg.as_ref().filter(|value| !value.is_none()) {
            frame.borrow_mut().set_generator_input(value.clone());
        }

        trace!(
            generator = self.name(),
            last_instruction = frame.borrow().last_instruction,
            pending = pending.is_some(),
            "resuming generator"
        );
        let outcome = {
            let _running = RunningGuard::new(&self.running);
            let mut frame = frame.borrow_mut();
            self.code.run(state, &mut frame, &self.closure, pending)
        };

        match outcome {
            Ok(FrameOutcome::Yielded(value)) => Ok(value),
            Ok(FrameOutcome::Returned(value)) => {
                self.terminate();
                Err(Exception::stop_iteration_with(value))
            }
            Ok(FrameOutcome::InnerExhausted(result)) => {
                frame.borrow_mut().finish_delegation(result);
                self.advance(state, arg)
            }
            Err(e) => {
                debug!(generator = self.name(), exception = %e, "generator raised");
                self.terminate();
                Err(e)
            }
        }
    }

    /// Drop the frame. Later calls see a finished generator.
    fn terminate(&self) {
        let frame = self.frame.borrow_mut().take();
        if let Some(frame) = frame {
            if let Ok(mut frame) = frame.try_borrow_mut() {
                frame.mark_finished();
                frame.yield_from = None;
            }
            debug!(generator = self.name(), "generator finished");
        }
    }

    /// `generator.throw(typ, value, traceback)`: raise an exception at the suspension point, or
    /// inside the iterator being delegated to.
    pub fn throw(
        &self,
        typ: Value,
        value: Option<Value>,
        traceback: Option<Value>,
    ) -> VmResult<Value> {
        let traceback = match traceback {
            None | Some(Value::None) => None,
            Some(Value::Traceback(traceback)) => Some(traceback),
            Some(_) => {
                return Err(Exception::type_error(
                    "throw() third argument must be a traceback object",
                ))
            }
        };
        if self.running.get() {
            return Err(Self::already_executing());
        }
        let Some(frame) = self.frame() else {
            return Err(Exception::stop_iteration());
        };
        let state = ThreadState::current();

        let yield_from = frame.borrow().yield_from.clone();
        let Some(inner) = yield_from else {
            return self.raise_into_frame(&state, &frame, &typ, value, traceback);
        };

        if typ.exception_kind() == Some(ExceptionKind::GeneratorExit) {
            trace!(generator = self.name(), "closing delegate before GeneratorExit");
            let closed = {
                let _running = RunningGuard::new(&self.running);
                close_iter(&inner)
            };
            if let Err(e) = closed {
                frame.borrow_mut().finish_delegation(Value::None);
                return Err(e);
            }
            return self.raise_into_frame(&state, &frame, &typ, value, traceback);
        }

        match &inner {
            Value::Generator(delegate) => {
                let result = {
                    let _running = RunningGuard::new(&self.running);
                    delegate.throw(
                        typ.clone(),
                        value.clone(),
                        traceback.clone().map(Value::Traceback),
                    )
                };
                match result {
                    Ok(value) => Ok(value),
                    Err(e) if e.kind() == ExceptionKind::StopIteration => {
                        frame.borrow_mut().finish_delegation(e.stop_value());
                        self.advance(&state, Some(Value::None))
                    }
                    Err(e) => self.inject(&state, &frame, e),
                }
            }
            Value::Iterator(delegate) => {
                let closed = {
                    let _running = RunningGuard::new(&self.running);
                    delegate.borrow_mut().close()
                };
                match closed {
                    Some(Err(e)) if !e.matches(ExceptionKind::AttributeError) => {
                        self.inject(&state, &frame, e)
                    }
                    _ => self.raise_into_frame(&state, &frame, &typ, value, traceback),
                }
            }
            _ => self.raise_into_frame(&state, &frame, &typ, value, traceback),
        }
    }

    fn raise_into_frame(
        &self,
        state: &ThreadState,
        frame: &Container<Frame>,
        typ: &Value,
        value: Option<Value>,
        traceback: Option<Traceback>,
    ) -> VmResult<Value> {
        let mut exception = Exception::normalize(typ, value.as_ref())?;
        if let Some(traceback) = traceback {
            exception.set_traceback(traceback);
        }
        self.inject(state, frame, exception)
    }

    /// Resume the frame with `exception` raised at its resume point.
    fn inject(
        &self,
        state: &ThreadState,
        frame: &Container<Frame>,
        exception: Exception,
    ) -> VmResult<Value> {
        {
            let mut frame = frame.borrow_mut();
            frame.yield_from = None;
            frame.previous_exception = Some(exception);
        }
        self.advance(state, None)
    }

    /// `generator.close()`: raise `GeneratorExit` at the suspension point and expect the body to
    /// finish. A body that yields instead is an error.
    pub fn close(&self) -> VmResult<Value> {
        if self.running.get() {
            return Err(Self::already_executing());
        }
        let Some(frame) = self.frame() else {
            return Ok(Value::None);
        };
        self.close_with(&ThreadState::current(), &frame)
    }

    fn close_with(&self, state: &ThreadState, frame: &Container<Frame>) -> VmResult<Value> {
        let yield_from = frame.borrow().yield_from.clone();
        if let Some(inner) = yield_from {
            let closed = {
                let _running = RunningGuard::new(&self.running);
                close_iter(&inner)
            };
            match closed {
                Err(e)
                    if !e.matches(ExceptionKind::StopIteration)
                        && !e.matches(ExceptionKind::GeneratorExit) =>
                {
                    // The delegate is unusable. A later resume continues after the `yield from`.
                    frame.borrow_mut().finish_delegation(Value::None);
                    return Err(e);
                }
                _ => frame.borrow_mut().yield_from = None,
            }
        }

        frame.borrow_mut().previous_exception = Some(Exception::generator_exit());
        match self.advance(state, None) {
            Ok(_) => Err(Exception::runtime_error("generator ignored GeneratorExit")),
            Err(e)
                if e.matches(ExceptionKind::StopIteration)
                    || e.matches(ExceptionKind::GeneratorExit) =>
            {
                Ok(Value::None)
            }
            Err(e) => Err(e),
        }
    }

    /// Close a generator that is being reclaimed while still suspended. Python exceptions are
    /// reported on the thread's diagnostic stream, host failures only to the log.
    fn finalize(&mut self) {
        let Some(frame) = self.frame.get_mut().clone() else {
            return;
        };
        let suspended = frame
            .try_borrow()
            .map(|frame| !frame.is_finished())
            .unwrap_or(false);
        if !suspended || thread::panicking() {
            return;
        }

        let state = match ThreadState::try_current() {
            Ok(state) => state,
            Err(e) => {
                debug!(error = %e, "skipping generator finalization");
                return;
            }
        };

        let this: &Self = self;
        match panic::catch_unwind(AssertUnwindSafe(|| this.close_with(&state, &frame))) {
            Ok(Ok(_)) => {}
            Ok(Err(exception)) => {
                let line = format!(
                    "Exception {}: {} in {}",
                    exception.kind(),
                    exception.message().unwrap_or_default(),
                    this.repr()
                );
                warn!(generator = this.name(), exception = %exception, "exception ignored in generator finalizer");
                if let Err(e) = state.write_stderr(&line) {
                    debug!(error = %e, "could not report finalization failure");
                }
            }
            Err(_) => debug!(generator = this.name(), "panic while finalizing generator"),
        }
    }

    pub fn gi_frame(&self) -> Option<Container<Frame>> {
        self.frame()
    }

    pub fn gi_code(&self) -> CodeObject {
        self.code.clone()
    }

    pub fn gi_running(&self) -> bool {
        self.running.get()
    }

    /// The iterator being delegated to, if any. Not observable while the generator runs.
    pub fn gi_yieldfrom(&self) -> Option<Value> {
        self.frame()?.try_borrow().ok()?.yield_from.clone()
    }

    pub fn name(&self) -> &str {
        self.code.name()
    }

    pub fn qualname(&self) -> &str {
        self.code.name()
    }

    pub fn closure(&self) -> &Value {
        &self.closure
    }

    pub fn state(&self) -> GeneratorState {
        if self.running.get() {
            return GeneratorState::Running;
        }
        let Some(frame) = self.frame() else {
            return GeneratorState::Finished;
        };
        let Ok(frame) = frame.try_borrow() else {
            return GeneratorState::Running;
        };
        if frame.is_finished() {
            GeneratorState::Finished
        } else if frame.yield_from.is_some() {
            GeneratorState::Delegating
        } else if !frame.is_started() {
            GeneratorState::Created
        } else {
            GeneratorState::Suspended
        }
    }

    /// Attribute lookup by name, for embedders exposing generators to Python code.
    pub fn get_attr(&self, name: &str) -> VmResult<Value> {
        match name {
            "gi_frame" => Ok(self.gi_frame().map(Value::Frame).unwrap_or_default()),
            "gi_code" => Ok(Value::Code(self.gi_code())),
            "gi_running" => Ok(Value::Bool(self.gi_running())),
            "gi_yieldfrom" => Ok(self.gi_yieldfrom().unwrap_or_default()),
            "__name__" => Ok(Value::from(self.name())),
            "__qualname__" => Ok(Value::from(self.qualname())),
            _ => Err(Exception::attribute_error("generator", name)),
        }
    }

    pub fn repr(&self) -> String {
        format!(
            "<generator object {} at {:#x}>",
            self.name(),
            self as *const Self as usize
        )
    }
}

impl Drop for Generator {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl Debug for Generator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr())
    }
}

impl Traverse for Generator {
    fn traverse(&self, visit: &mut dyn FnMut(&Value) -> ControlFlow<()>) -> ControlFlow<()> {
        if let Some(frame) = self.frame() {
            visit(&Value::Frame(frame))?;
        }
        visit(&Value::Code(self.code.clone()))?;
        if !self.closure.is_none() {
            visit(&self.closure)?;
        }
        ControlFlow::Continue(())
    }

    fn refers_directly_to(&self, object: &Value) -> bool {
        if object.is_none() {
            return false;
        }
        let holds_frame = match (self.frame(), object) {
            (Some(frame), Value::Frame(other)) => frame.same_identity(other),
            _ => false,
        };
        let holds_code = matches!(object, Value::Code(code) if code.same_identity(&self.code));
        holds_frame || holds_code || self.closure.same_identity(object)
    }
}

/// Adapts a generator to Rust's `Iterator`. Iteration ends after exhaustion or the first error.
pub struct GeneratorIterator {
    generator: Rc<Generator>,
    done: bool,
}

impl GeneratorIterator {
    pub fn new(generator: Rc<Generator>) -> Self {
        Self {
            generator,
            done: false,
        }
    }
}

impl Iterator for GeneratorIterator {
    type Item = VmResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.generator.dunder_next() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
