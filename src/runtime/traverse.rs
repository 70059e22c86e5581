use std::ops::ControlFlow;

use crate::runtime::Value;

/// Reference enumeration for a cycle collector. `traverse` reports every value the object holds a
/// strong reference to, stopping as soon as the visitor breaks.
pub trait Traverse {
    fn traverse(&self, visit: &mut dyn FnMut(&Value) -> ControlFlow<()>) -> ControlFlow<()>;

    /// Whether `object` is one of the values `traverse` would report.
    fn refers_directly_to(&self, object: &Value) -> bool;
}

/// Collect everything `object` refers to. Mostly useful for inspection and tests.
pub fn referents(object: &dyn Traverse) -> Vec<Value> {
    let mut found = vec![];
    let _ = object.traverse(&mut |value| {
        found.push(value.clone());
        ControlFlow::Continue(())
    });
    found
}
