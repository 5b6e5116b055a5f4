//! Lock error types

use std::io;

use thiserror::Error;

/// Result type for lock operations
pub type LockResult<T> = Result<T, LockError>;

/// Lock errors
#[derive(Debug, Error)]
pub enum LockError {
    /// The OS refused or failed a lock call
    #[error("advisory lock call failed: {0}")]
    Io(#[from] io::Error),

    /// A state transition failed halfway and the handle's lock state is unknown
    #[error("lock state is unknown after a failed transition")]
    Poisoned,
}
