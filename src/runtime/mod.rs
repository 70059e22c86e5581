mod exception;
mod iterator;
mod thread_state;
mod traverse;
pub mod types;
mod value;

pub use exception::{Exception, Traceback};
pub use iterator::{close_iter, get_iter, Iterable, ListIterator};
pub use thread_state::{DepthGuard, ThreadState, ThreadStateBuilder, DEFAULT_RECURSION_LIMIT};
pub use traverse::{referents, Traverse};
pub use value::Value;

/// The result of anything that can raise a Python exception.
pub type VmResult<T> = Result<T, Exception>;
