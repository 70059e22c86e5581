use std::fmt::{Debug, Display, Error, Formatter};

use super::DebugStackFrame;

/// The frames an exception has unwound through, innermost last.
///
/// Example output in Python-like format:
///
/// ```text
/// Traceback (most recent call last):
///   File "<test>", offset 4, in outer
///   File "<test>", offset 1, in inner
/// ```
#[derive(PartialEq, Clone, Default)]
pub struct DebugCallStack {
    frames: Vec<DebugStackFrame>,
}

impl DebugCallStack {
    pub fn new() -> Self {
        Self { frames: vec![] }
    }

    /// An exception raised in `inner` and escaping through `outer` records `inner` first, so new
    /// entries go to the front to keep the most recent call last.
    pub fn push_outer(&mut self, stack_frame: DebugStackFrame) {
        self.frames.insert(0, stack_frame);
    }

    pub fn frames(&self) -> &[DebugStackFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl Display for DebugCallStack {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        writeln!(f, "Traceback (most recent call last):")?;
        for frame in &self.frames {
            writeln!(f, "  {frame}")?;
        }
        Ok(())
    }
}

impl Debug for DebugCallStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self, f)
    }
}
