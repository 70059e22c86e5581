use std::rc::Rc;

use crate::runtime::{types::Generator, Value};

/// Drain a generator through the iterator protocol, panicking on any exception.
pub fn collect(generator: &Rc<Generator>) -> Vec<Value> {
    let mut items = vec![];
    while let Some(item) = generator
        .dunder_next()
        .unwrap_or_else(|e| panic!("Generator raised: {e:?}"))
    {
        items.push(item);
    }
    items
}
