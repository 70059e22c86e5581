use thiserror::Error;

/// Problems found while assembling bytecode. These are bugs in whoever produced the instructions,
/// not Python exceptions.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum CompilerError {
    #[error("label {0} is used but never bound")]
    UnboundLabel(usize),

    #[error("label {0} is bound more than once")]
    DuplicateLabel(usize),
}
