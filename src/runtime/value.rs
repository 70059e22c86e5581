use std::{
    fmt::{Debug, Display, Error, Formatter},
    rc::Rc,
};

use crate::{
    core::Container,
    domain::{ExceptionKind, Type},
    runtime::{
        types::{CodeObject, Frame, Generator},
        Exception, Iterable, Traceback,
    },
};

/// A runtime value as seen by generator frames. Primitive values are stored inline, everything
/// with Python identity is shared behind an `Rc`.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Container<Vec<Value>>),
    /// Any non-generator iterator, builtin or provided by the embedder.
    Iterator(Container<Box<dyn Iterable>>),
    Generator(Rc<Generator>),
    Frame(Container<Frame>),
    Code(CodeObject),
    /// An exception class, such as the first argument to `generator.throw(ValueError)`.
    ExceptionType(ExceptionKind),
    Exception(Box<Exception>),
    Traceback(Traceback),
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Container::new(items))
    }

    pub fn new_iterator(iterator: impl Iterable + 'static) -> Self {
        Value::Iterator(Container::new(Box::new(iterator)))
    }

    pub fn get_type(&self) -> Type {
        match self {
            Value::None => Type::None,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Str(_) => Type::Str,
            Value::List(_) => Type::List,
            Value::Iterator(_) => Type::Iterator,
            Value::Generator(_) => Type::Generator,
            Value::Frame(_) => Type::Frame,
            Value::Code(_) => Type::Code,
            Value::ExceptionType(_) => Type::Type,
            Value::Exception(_) => Type::Exception,
            Value::Traceback(_) => Type::Traceback,
        }
    }

    /// The name used in error messages such as `'int' object is not iterable`. Exceptions and
    /// iterators report their own class name.
    pub fn type_name(&self) -> String {
        match self {
            Value::Iterator(iterator) => iterator.borrow().type_name().to_string(),
            Value::Exception(exception) => exception.kind().to_string(),
            _ => self.get_type().to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_generator(&self) -> Option<&Rc<Generator>> {
        match self {
            Value::Generator(generator) => Some(generator),
            _ => None,
        }
    }

    pub fn as_exception(&self) -> Option<&Exception> {
        match self {
            Value::Exception(exception) => Some(exception),
            _ => None,
        }
    }

    /// The exception class this value stands for when raised: the class itself, or the class of
    /// an exception instance.
    pub fn exception_kind(&self) -> Option<ExceptionKind> {
        match self {
            Value::ExceptionType(kind) => Some(*kind),
            Value::Exception(exception) => Some(exception.kind()),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    /// Python's `is`. Primitives compare by value, everything else by allocation.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.same_identity(b),
            (Value::Iterator(a), Value::Iterator(b)) => a.same_identity(b),
            (Value::Generator(a), Value::Generator(b)) => Rc::ptr_eq(a, b),
            (Value::Frame(a), Value::Frame(b)) => a.same_identity(b),
            (Value::Code(a), Value::Code(b)) => a.same_identity(b),
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            _ => false,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{s}'"),
            Value::List(items) => {
                let items: Vec<String> = items.borrow().iter().map(|i| i.repr()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Exception(exception) => exception.repr(),
            _ => self.to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(_) => write!(f, "{}", self.repr()),
            Value::Iterator(iterator) => write!(
                f,
                "<{} object at {:#x}>",
                iterator.borrow().type_name(),
                iterator.address()
            ),
            Value::Generator(generator) => write!(f, "{}", generator.repr()),
            Value::Frame(frame) => write!(f, "<frame at {:#x}>", frame.address()),
            Value::Code(code) => write!(f, "{}", code.repr()),
            Value::ExceptionType(kind) => write!(f, "<class '{kind}'>"),
            Value::Exception(exception) => {
                write!(f, "{}", exception.message().unwrap_or_default())
            }
            Value::Traceback(_) => write!(f, "<traceback object>"),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.repr())
    }
}

/// Structural equality for data, identity for objects. Test assertions lean on this.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.same_identity(b) || *a.borrow() == *b.borrow(),
            (Value::Exception(a), Value::Exception(b)) => a == b,
            (Value::Traceback(a), Value::Traceback(b)) => a == b,
            _ => self.same_identity(other),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Exception> for Value {
    fn from(value: Exception) -> Self {
        Value::Exception(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reprs() {
        assert_eq!(Value::None.repr(), "None");
        assert_eq!(Value::from("a").repr(), "'a'");
        assert_eq!(Value::from("a").to_string(), "a");
        assert_eq!(
            Value::new_list(vec![Value::Int(1), Value::from("b")]).repr(),
            "[1, 'b']"
        );
        assert_eq!(
            Value::ExceptionType(ExceptionKind::ValueError).repr(),
            "<class 'ValueError'>"
        );
        assert_eq!(
            Value::from(Exception::value_error("x")).repr(),
            "ValueError('x')"
        );
    }

    #[test]
    fn identity_versus_equality() {
        let a = Value::new_list(vec![Value::Int(1)]);
        let b = Value::new_list(vec![Value::Int(1)]);

        assert_eq!(a, b);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
        assert!(Value::None.same_identity(&Value::None));
        assert!(!Value::from("x").same_identity(&Value::from("x")));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(3).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::new_list(vec![]).is_truthy());
        assert!(Value::ExceptionType(ExceptionKind::TypeError).is_truthy());
    }
}
