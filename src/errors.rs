use std::{cell::BorrowMutError, io, thread::AccessError};

use thiserror::Error;

/// Failures of the host environment rather than of Python code. These never reach Python code:
/// the only place they can occur is generator finalization, which logs and swallows them.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to write diagnostic: {0}")]
    Io(#[from] io::Error),

    #[error("thread state is no longer available: {0}")]
    ThreadStateUnavailable(#[from] AccessError),

    #[error("diagnostic stream is already in use")]
    StreamBusy(#[from] BorrowMutError),
}
