mod constructors;
mod helpers;
mod programs;

pub(crate) use constructors::*;
pub(crate) use helpers::*;
pub(crate) use programs::*;
