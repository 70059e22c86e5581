use std::fmt::{Display, Error, Formatter};

/// The built-in exception classes known to the generator machinery. User code can only raise and
/// catch these; the hierarchy mirrors Python's so that `except Exception` does not swallow
/// `GeneratorExit`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ExceptionKind {
    BaseException,
    GeneratorExit,
    Exception,
    StopIteration,
    TypeError,
    ValueError,
    RuntimeError,
    RecursionError,
    AttributeError,
    LookupError,
    KeyError,
    ArithmeticError,
    OverflowError,
    NameError,
    SystemError,
}

impl ExceptionKind {
    fn value(&self) -> &'static str {
        match self {
            Self::BaseException => "BaseException",
            Self::GeneratorExit => "GeneratorExit",
            Self::Exception => "Exception",
            Self::StopIteration => "StopIteration",
            Self::TypeError => "TypeError",
            Self::ValueError => "ValueError",
            Self::RuntimeError => "RuntimeError",
            Self::RecursionError => "RecursionError",
            Self::AttributeError => "AttributeError",
            Self::LookupError => "LookupError",
            Self::KeyError => "KeyError",
            Self::ArithmeticError => "ArithmeticError",
            Self::OverflowError => "OverflowError",
            Self::NameError => "NameError",
            Self::SystemError => "SystemError",
        }
    }

    /// The direct base class, or `None` for `BaseException`.
    pub fn parent(&self) -> Option<ExceptionKind> {
        match self {
            Self::BaseException => None,
            Self::GeneratorExit | Self::Exception => Some(Self::BaseException),
            Self::RecursionError => Some(Self::RuntimeError),
            Self::KeyError => Some(Self::LookupError),
            Self::OverflowError => Some(Self::ArithmeticError),
            _ => Some(Self::Exception),
        }
    }

    /// Python's `issubclass(self, other)`.
    pub fn is_subclass_of(&self, other: &ExceptionKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == *other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl Display for ExceptionKind {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.write_str(self.value())
    }
}
