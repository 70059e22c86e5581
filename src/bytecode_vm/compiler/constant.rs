use std::fmt::{Display, Error, Formatter};

use crate::{domain::ExceptionKind, runtime::Value};

/// The values which may live in a constant pool: the immutable subset of [`Value`].
#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    None,
    Boolean(bool),
    Int(i64),
    String(String),
    ExceptionType(ExceptionKind),
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            Constant::None => write!(f, "None"),
            Constant::Boolean(i) => write!(f, "{}", i),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::String(i) => write!(f, "'{}'", i),
            Constant::ExceptionType(i) => write!(f, "{}", i),
        }
    }
}

impl From<&Constant> for Value {
    fn from(value: &Constant) -> Self {
        match value {
            Constant::None => Value::None,
            Constant::Boolean(b) => Value::Bool(*b),
            Constant::Int(i) => Value::Int(*i),
            Constant::String(s) => Value::Str(s.clone()),
            Constant::ExceptionType(kind) => Value::ExceptionType(*kind),
        }
    }
}

impl From<i64> for Constant {
    fn from(value: i64) -> Self {
        Constant::Int(value)
    }
}

impl From<i32> for Constant {
    fn from(value: i32) -> Self {
        Constant::Int(value.into())
    }
}

impl From<bool> for Constant {
    fn from(value: bool) -> Self {
        Constant::Boolean(value)
    }
}

impl From<&str> for Constant {
    fn from(value: &str) -> Self {
        Constant::String(value.to_string())
    }
}

impl From<ExceptionKind> for Constant {
    fn from(value: ExceptionKind) -> Self {
        Constant::ExceptionType(value)
    }
}
