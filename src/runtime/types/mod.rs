mod code;
mod frame;
mod generator;

pub use code::{CodeObject, Executable, FrameOutcome};
pub use frame::{Frame, HandlerBlock, FRAME_FINISHED, FRAME_NOT_STARTED};
pub use generator::{Generator, GeneratorIterator, GeneratorState};
