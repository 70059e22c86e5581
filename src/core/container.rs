use std::{
    cell::RefCell,
    fmt::{Error, Formatter, Pointer},
    ops::Deref,
    rc::Rc,
};

/// A shared, mutable handle used for every runtime object that has identity (frames, lists,
/// iterators).
#[derive(Debug, PartialEq)]
pub struct Container<T: ?Sized>(Rc<RefCell<T>>);

impl<T> Container<T> {
    pub fn new(value: T) -> Self {
        Container(Rc::new(RefCell::new(value)))
    }
}

impl<T: ?Sized> Container<T> {
    /// Two `Container` objects have the same identity when they point to the same allocation.
    /// This is Python's `is`, whereas `==` on a `Container<T>` compares the inner `T` values.
    pub fn same_identity(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The address of the shared allocation, used in reprs such as `<generator object .. at 0x..>`.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T> From<Rc<RefCell<T>>> for Container<T> {
    fn from(value: Rc<RefCell<T>>) -> Self {
        Container(value)
    }
}

impl<T: ?Sized> Pointer for Container<T> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{:p}", self.0)
    }
}

impl<T: ?Sized> Deref for Container<T> {
    type Target = RefCell<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Cloning a `Container<T>` bumps the reference count, it never clones the inner `T`. This is
/// implemented by hand so that `T: Clone` is not required.
impl<T: ?Sized> Clone for Container<T> {
    fn clone(&self) -> Self {
        Container(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_not_equality() {
        let a = Container::new(vec![1, 2]);
        let b = Container::new(vec![1, 2]);
        let c = a.clone();

        assert_eq!(a, b);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&c));
        assert_eq!(a.address(), c.address());
    }
}
