use std::{
    cell::{Cell, RefCell},
    io::{self, Write},
    rc::Rc,
};

use tracing::debug;

use crate::{
    errors::HostError,
    runtime::{Exception, VmResult},
};

pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

thread_local! {
    static CURRENT: RefCell<Rc<ThreadState>> = RefCell::new(Rc::new(ThreadState::default()));
}

/// Per-thread interpreter state: the recursion budget shared by nested generator resumptions and
/// the stream finalization diagnostics are written to.
pub struct ThreadState {
    recursion_limit: usize,
    depth: Cell<usize>,
    stderr: RefCell<Box<dyn Write>>,
}

impl Default for ThreadState {
    fn default() -> Self {
        ThreadStateBuilder::new().build()
    }
}

impl ThreadState {
    pub fn builder() -> ThreadStateBuilder {
        ThreadStateBuilder::new()
    }

    /// The state of the calling thread.
    pub fn current() -> Rc<ThreadState> {
        CURRENT.with(|state| state.borrow().clone())
    }

    /// Like [`ThreadState::current`], but usable while the thread is being torn down.
    pub fn try_current() -> Result<Rc<ThreadState>, HostError> {
        Ok(CURRENT.try_with(|state| state.borrow().clone())?)
    }

    fn install(state: ThreadState) -> Rc<ThreadState> {
        let state = Rc::new(state);
        CURRENT.with(|current| *current.borrow_mut() = state.clone());
        state
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Account for one more nested frame resumption, failing with `RecursionError` once the limit
    /// is reached. The depth is released when the guard drops.
    pub fn enter(&self) -> VmResult<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.recursion_limit {
            return Err(Exception::recursion_error());
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { state: self })
    }

    pub fn write_stderr(&self, line: &str) -> Result<(), HostError> {
        let mut stderr = self.stderr.try_borrow_mut()?;
        writeln!(stderr, "{line}")?;
        stderr.flush()?;
        Ok(())
    }
}

pub struct DepthGuard<'a> {
    state: &'a ThreadState,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.state.depth.set(self.state.depth.get().saturating_sub(1));
    }
}

pub struct ThreadStateBuilder {
    recursion_limit: usize,
    stderr: Option<Box<dyn Write>>,
}

impl Default for ThreadStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadStateBuilder {
    pub fn new() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            stderr: None,
        }
    }

    pub fn recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Where finalization diagnostics go. Defaults to the process's standard error.
    pub fn stderr(&mut self, stream: impl Write + 'static) -> &mut Self {
        self.stderr = Some(Box::new(stream));
        self
    }

    pub fn build(&mut self) -> ThreadState {
        ThreadState {
            recursion_limit: self.recursion_limit,
            depth: Cell::new(0),
            stderr: RefCell::new(self.stderr.take().unwrap_or_else(|| Box::new(io::stderr()))),
        }
    }

    /// Build the state and make it the current state of the calling thread.
    pub fn install(&mut self) -> Rc<ThreadState> {
        let state = self.build();
        debug!(
            recursion_limit = state.recursion_limit,
            "installing thread state"
        );
        ThreadState::install(state)
    }
}
