use crate::{
    core::Container,
    domain::{ExceptionKind, Type},
    runtime::{Exception, Value, VmResult},
};

/// An object that can be stepped with `next()`. Generators have their own protocol; this trait
/// covers every other iterator a frame may loop over or delegate to.
pub trait Iterable {
    fn type_name(&self) -> &str;

    /// The next item, or `None` once exhausted.
    fn next(&mut self) -> VmResult<Option<Value>>;

    /// Forward a value during `yield from` delegation. Iterators without a `send` method only
    /// accept `None`, which is the same as `next()`.
    fn send(&mut self, value: Value) -> VmResult<Option<Value>> {
        if value.is_none() {
            self.next()
        } else {
            Err(Exception::attribute_error(self.type_name(), "send"))
        }
    }

    /// `close()`, when the iterator has one. `None` means the method does not exist.
    fn close(&mut self) -> Option<VmResult<Value>> {
        None
    }
}

pub struct ListIterator {
    list: Container<Vec<Value>>,
    index: usize,
}

impl ListIterator {
    pub fn new(list: Container<Vec<Value>>) -> Self {
        Self { list, index: 0 }
    }
}

impl Iterable for ListIterator {
    fn type_name(&self) -> &str {
        (&Type::ListIter).into()
    }

    fn next(&mut self) -> VmResult<Option<Value>> {
        let item = self.list.borrow().get(self.index).cloned();
        if item.is_some() {
            self.index += 1;
        }
        Ok(item)
    }
}

/// Python's `iter(value)`. Generators and iterators are their own iterators.
pub fn get_iter(value: &Value) -> VmResult<Value> {
    match value {
        Value::List(list) => Ok(Value::new_iterator(ListIterator::new(list.clone()))),
        Value::Generator(_) | Value::Iterator(_) => Ok(value.clone()),
        _ => Err(Exception::type_error(&format!(
            "'{}' object is not iterable",
            value.type_name()
        ))),
    }
}

/// Close a delegation target. Iterators without a `close` method are left alone.
pub fn close_iter(iterator: &Value) -> VmResult<Value> {
    match iterator {
        Value::Generator(generator) => generator.close(),
        Value::Iterator(iterator) => match iterator.borrow_mut().close() {
            None => Ok(Value::None),
            Some(Err(e)) if e.kind() == ExceptionKind::AttributeError => Ok(Value::None),
            Some(result) => result,
        },
        _ => Ok(Value::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_utils::*;

    struct Closable {
        closed: Container<bool>,
        result: Option<VmResult<Value>>,
    }

    impl Iterable for Closable {
        fn type_name(&self) -> &str {
            "closable"
        }

        fn next(&mut self) -> VmResult<Option<Value>> {
            Ok(None)
        }

        fn close(&mut self) -> Option<VmResult<Value>> {
            *self.closed.borrow_mut() = true;
            self.result.take()
        }
    }

    #[test]
    fn list_iteration() {
        let list = Value::new_list(vec![Value::Int(1), Value::Int(2)]);
        let Value::Iterator(iterator) = get_iter(&list).unwrap() else {
            panic!("Expected an iterator");
        };
        let mut iterator = iterator.borrow_mut();

        assert_eq!(iterator.type_name(), "list_iterator");
        assert_eq!(iterator.next().unwrap(), Some(Value::Int(1)));
        assert_eq!(iterator.next().unwrap(), Some(Value::Int(2)));
        assert_eq!(iterator.next().unwrap(), None);
        assert_eq!(iterator.next().unwrap(), None);
    }

    #[test]
    fn send_requires_none() {
        let mut iterator = ListIterator::new(Container::new(vec![Value::Int(1)]));
        assert_eq!(iterator.send(Value::None).unwrap(), Some(Value::Int(1)));

        let e = iterator.send(Value::Int(1)).unwrap_err();
        assert_exception!(
            e,
            ExceptionKind::AttributeError,
            "'list_iterator' object has no attribute 'send'"
        );
    }

    #[test]
    fn not_iterable() {
        let e = get_iter(&Value::Int(4)).unwrap_err();
        assert_type_error!(e, "'int' object is not iterable");
    }

    #[test]
    fn iter_of_iterator_is_identity() {
        let iterator = Value::new_iterator(ListIterator::new(Container::new(vec![])));
        assert!(get_iter(&iterator).unwrap().same_identity(&iterator));
    }

    #[test]
    fn close_iter_tolerates_missing_close() {
        let iterator = Value::new_iterator(ListIterator::new(Container::new(vec![])));
        assert_eq!(close_iter(&iterator).unwrap(), Value::None);

        let closed = Container::new(false);
        let iterator = Value::new_iterator(Closable {
            closed: closed.clone(),
            result: Some(Err(Exception::attribute_error("closable", "close"))),
        });
        assert_eq!(close_iter(&iterator).unwrap(), Value::None);
        assert!(*closed.borrow());

        let iterator = Value::new_iterator(Closable {
            closed: Container::new(false),
            result: Some(Err(Exception::value_error("refused"))),
        });
        let e = close_iter(&iterator).unwrap_err();
        assert_value_error!(e, "refused");
    }
}
