use std::fmt::{Display, Error, Formatter};

/// Represents the logical Python type of a value, as shown in error messages or `type()` calls.
/// This is not tied to any specific runtime engine.
#[derive(Debug, PartialEq, Clone, Copy, Hash, Eq)]
pub enum Type {
    #[allow(clippy::enum_variant_names)]
    Type,
    None,
    Bool,
    Int,
    Str,
    List,
    ListIter,
    Iterator,
    Generator,
    Frame,
    Code,
    Traceback,
    Exception,
}

impl Type {
    fn value(&self) -> &'static str {
        match self {
            Type::Type => "type",
            Type::None => "NoneType",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Str => "str",
            Type::List => "list",
            Type::ListIter => "list_iterator",
            Type::Iterator => "iterator",
            Type::Generator => "generator",
            Type::Frame => "frame",
            Type::Code => "code",
            Type::Traceback => "traceback",
            Type::Exception => "Exception",
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        f.write_str(self.value())
    }
}

impl From<&Type> for &str {
    fn from(value: &Type) -> Self {
        value.value()
    }
}
