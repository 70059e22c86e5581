use std::fmt::{Debug, Display, Error, Formatter};

use crate::{
    domain::{DebugCallStack, DebugStackFrame, ExceptionKind},
    runtime::{Value, VmResult},
};

/// A traceback object as passed to the third argument of `generator.throw`.
#[derive(Clone, PartialEq, Default)]
pub struct Traceback {
    call_stack: DebugCallStack,
}

impl Traceback {
    pub fn new(call_stack: DebugCallStack) -> Self {
        Self { call_stack }
    }

    pub fn call_stack(&self) -> &DebugCallStack {
        &self.call_stack
    }
}

impl Debug for Traceback {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.call_stack, f)
    }
}

/// A raised Python exception: its class, its constructor arguments and the frames it unwound
/// through.
#[derive(Clone, PartialEq)]
pub struct Exception {
    kind: ExceptionKind,
    args: Vec<Value>,
    traceback: Option<Traceback>,
}

impl Exception {
    pub fn new(kind: ExceptionKind, args: Vec<Value>) -> Self {
        Self {
            kind,
            args,
            traceback: None,
        }
    }

    pub fn new_empty(kind: ExceptionKind) -> Self {
        Self::new(kind, vec![])
    }

    pub fn with_message(kind: ExceptionKind, message: &str) -> Self {
        Self::new(kind, vec![Value::from(message)])
    }

    pub fn stop_iteration() -> Self {
        Self::new_empty(ExceptionKind::StopIteration)
    }

    /// End of iteration carrying a return value. A `None` return leaves the exception empty.
    pub fn stop_iteration_with(value: Value) -> Self {
        if value.is_none() {
            Self::stop_iteration()
        } else {
            Self::new(ExceptionKind::StopIteration, vec![value])
        }
    }

    pub fn generator_exit() -> Self {
        Self::new_empty(ExceptionKind::GeneratorExit)
    }

    pub fn type_error(message: &str) -> Self {
        Self::with_message(ExceptionKind::TypeError, message)
    }

    pub fn value_error(message: &str) -> Self {
        Self::with_message(ExceptionKind::ValueError, message)
    }

    pub fn runtime_error(message: &str) -> Self {
        Self::with_message(ExceptionKind::RuntimeError, message)
    }

    pub fn recursion_error() -> Self {
        Self::with_message(
            ExceptionKind::RecursionError,
            "maximum recursion depth exceeded",
        )
    }

    pub fn attribute_error(type_name: &str, attr: &str) -> Self {
        Self::with_message(
            ExceptionKind::AttributeError,
            &format!("'{type_name}' object has no attribute '{attr}'"),
        )
    }

    pub fn name_error(message: &str) -> Self {
        Self::with_message(ExceptionKind::NameError, message)
    }

    pub fn system_error(message: &str) -> Self {
        Self::with_message(ExceptionKind::SystemError, message)
    }

    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// `str(exception)`, or `None` when the exception was raised without arguments.
    pub fn message(&self) -> Option<String> {
        match self.args.as_slice() {
            [] => None,
            [single] => Some(single.to_string()),
            many => {
                let items: Vec<String> = many.iter().map(|a| a.repr()).collect();
                Some(format!("({})", items.join(", ")))
            }
        }
    }

    /// Whether `except <kind>` would catch this exception.
    pub fn matches(&self, kind: ExceptionKind) -> bool {
        self.kind.is_subclass_of(&kind)
    }

    /// The value a finished generator or iterator returned. Only meaningful for `StopIteration`.
    pub fn stop_value(&self) -> Value {
        self.args.first().cloned().unwrap_or_default()
    }

    pub fn traceback(&self) -> Option<&Traceback> {
        self.traceback.as_ref()
    }

    pub fn set_traceback(&mut self, traceback: Traceback) {
        self.traceback = Some(traceback);
    }

    /// Record a frame this exception is escaping from.
    pub fn push_stack_frame(&mut self, stack_frame: DebugStackFrame) {
        self.traceback
            .get_or_insert_with(Traceback::default)
            .call_stack
            .push_outer(stack_frame);
    }

    pub fn repr(&self) -> String {
        let items: Vec<String> = self.args.iter().map(|a| a.repr()).collect();
        format!("{}({})", self.kind, items.join(", "))
    }

    /// Turn the `(type, value)` pair of a `throw` call into the exception to raise.
    ///
    /// - a class with no value instantiates the class,
    /// - a class with an instance of that class (or a subclass) raises the instance,
    /// - a class with any other value instantiates the class with the value as its argument,
    /// - an instance may not come with a separate value.
    pub fn normalize(typ: &Value, value: Option<&Value>) -> VmResult<Exception> {
        let value = value.filter(|v| !v.is_none());
        match (typ, value) {
            (Value::ExceptionType(kind), None) => Ok(Exception::new_empty(*kind)),
            (Value::ExceptionType(kind), Some(Value::Exception(instance)))
                if instance.matches(*kind) =>
            {
                Ok(*instance.clone())
            }
            (Value::ExceptionType(kind), Some(arg)) => Ok(Exception::new(*kind, vec![arg.clone()])),
            (Value::Exception(_), Some(_)) => Err(Exception::type_error(
                "instance exception may not have a separate value",
            )),
            (Value::Exception(instance), None) => Ok(*instance.clone()),
            (other, _) => Err(Exception::type_error(&format!(
                "exceptions must be classes or instances deriving from BaseException, not {}",
                other.type_name()
            ))),
        }
    }
}

impl Display for Exception {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self.message() {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Debug for Exception {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(traceback) = &self.traceback {
            write!(f, "{traceback:?}")?;
        }
        write!(f, "{self}")
    }
}

impl std::error::Error for Exception {}
