use std::fmt::{Display, Error, Formatter};

/// A trait that defines the ability to convert an object into a `DebugStackFrame`. Frames that
/// an exception unwinds through use this to extend its traceback.
pub trait ToDebugStackFrame {
    fn to_stack_frame(&self) -> DebugStackFrame;
}

/// One entry of a traceback.
///
/// Each frame includes:
/// - The name of the code object being executed.
/// - The file the code object was compiled from.
/// - The instruction offset at which the exception passed through.
#[derive(Debug, PartialEq, Clone)]
pub struct DebugStackFrame {
    name: String,
    filename: String,
    offset: usize,
}

impl DebugStackFrame {
    pub fn new(name: &str, filename: &str, offset: usize) -> Self {
        Self {
            name: name.to_string(),
            filename: filename.to_string(),
            offset,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Display for DebugStackFrame {
    /// Formats the stack frame for display in a traceback-like format.
    ///
    /// Example output:
    /// `File "path/to/file.py", offset 42, in function_name`
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(
            f,
            "File \"{}\", offset {}, in {}",
            self.filename, self.offset, self.name
        )
    }
}
