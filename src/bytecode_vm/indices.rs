use std::{
    any,
    fmt::{Debug, Display, Error, Formatter},
    marker::PhantomData,
    ops::Deref,
};

/// An unsigned integer wrapper which provides type safety. Constant pool slots and local variable
/// slots are both small integers; the marker keeps one from being used as the other.
#[derive(Copy, Clone, PartialEq, Hash, Eq)]
pub struct Index<T> {
    value: usize,
    _marker: PhantomData<T>,
}

impl<T> Index<T> {
    pub fn new(value: usize) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }
}

impl<T> Deref for Index<T> {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> Display for Index<T> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{}", self.value)
    }
}

impl<T> Debug for Index<T> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let full_type_name = any::type_name::<T>();
        let type_name = full_type_name.rsplit("::").next().unwrap_or(full_type_name);
        write!(f, "{}({})", type_name, self.value)
    }
}

#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug)]
pub struct ConstantMarker;
#[derive(Copy, Clone, Hash, PartialEq, Eq, Debug)]
pub struct LocalMarker;

pub type ConstantIndex = Index<ConstantMarker>;
pub type LocalIndex = Index<LocalMarker>;
