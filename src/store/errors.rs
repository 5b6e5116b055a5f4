//! Store error types
//!
//! Filesystem "not found" and "already exists" conditions are translated
//! here into the store taxonomy. Every other OS error stays an `Io` error.
//!
//! `InvalidLockState` means a handle no longer knows what it holds and must
//! not be recovered from; the lock logs it as a FATAL event.

use std::io;

use thiserror::Error;

use crate::codec::CodecError;
use crate::lock::LockError;
use crate::observability::Severity;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database already exists: {0}")]
    DatabaseAlreadyExists(String),

    #[error("database does not exist: {0}")]
    DatabaseDoesNotExist(String),

    #[error("table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("table does not exist: {0}")]
    TableDoesNotExist(String),

    #[error("row already exists: {0}")]
    RowAlreadyExists(String),

    #[error("row does not exist: {0}")]
    RowDoesNotExist(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("row '{0}' was opened read-only")]
    ReadOnlyRow(String),

    #[error("no free key of length {length} after {attempts} attempts")]
    UniqueKeyExhausted { length: usize, attempts: u32 },

    #[error("invalid lock state: {0}")]
    InvalidLockState(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DatabaseAlreadyExists(_) => "DIRDB_DATABASE_ALREADY_EXISTS",
            StoreError::DatabaseDoesNotExist(_) => "DIRDB_DATABASE_DOES_NOT_EXIST",
            StoreError::TableAlreadyExists(_) => "DIRDB_TABLE_ALREADY_EXISTS",
            StoreError::TableDoesNotExist(_) => "DIRDB_TABLE_DOES_NOT_EXIST",
            StoreError::RowAlreadyExists(_) => "DIRDB_ROW_ALREADY_EXISTS",
            StoreError::RowDoesNotExist(_) => "DIRDB_ROW_DOES_NOT_EXIST",
            StoreError::InvalidName { .. } => "DIRDB_INVALID_NAME",
            StoreError::ReadOnlyRow(_) => "DIRDB_READ_ONLY_ROW",
            StoreError::UniqueKeyExhausted { .. } => "DIRDB_UNIQUE_KEY_EXHAUSTED",
            StoreError::InvalidLockState(_) => "DIRDB_INVALID_LOCK_STATE",
            StoreError::Codec(e) => e.code(),
            StoreError::Io(_) => "DIRDB_IO_ERROR",
        }
    }

    /// ERROR for everything except `InvalidLockState`, which is FATAL
    pub fn severity(&self) -> Severity {
        match self {
            StoreError::InvalidLockState(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl From<LockError> for StoreError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Io(io) => StoreError::Io(io),
            LockError::Poisoned => StoreError::InvalidLockState(e.to_string()),
        }
    }
}

/// Map `NotFound` to `missing()`, anything else to `Io`
pub(crate) fn not_found_or(e: io::Error, missing: impl FnOnce() -> StoreError) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        missing()
    } else {
        StoreError::Io(e)
    }
}

/// Map `AlreadyExists` to `exists()`, anything else to `Io`
pub(crate) fn exists_or(e: io::Error, exists: impl FnOnce() -> StoreError) -> StoreError {
    if e.kind() == io::ErrorKind::AlreadyExists {
        exists()
    } else {
        StoreError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lock_state_is_fatal() {
        assert_eq!(StoreError::InvalidLockState("x".into()).severity(), Severity::Fatal);
        assert_eq!(StoreError::RowDoesNotExist("r1".into()).severity(), Severity::Error);
        assert_eq!(
            StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk")).severity(),
            Severity::Error
        );
    }

    #[test]
    fn test_poisoned_lock_maps_to_invalid_state() {
        let err = StoreError::from(LockError::Poisoned);
        assert!(matches!(err, StoreError::InvalidLockState(_)));
        assert_eq!(err.code(), "DIRDB_INVALID_LOCK_STATE");
    }

    #[test]
    fn test_codec_code_passes_through() {
        let err = StoreError::from(CodecError::UnsupportedType("x".into()));
        assert_eq!(err.code(), "DIRDB_CODEC_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_io_mapping() {
        let missing = not_found_or(io::Error::from(io::ErrorKind::NotFound), || {
            StoreError::RowDoesNotExist("r1".into())
        });
        assert!(matches!(missing, StoreError::RowDoesNotExist(_)));

        let denied = not_found_or(io::Error::from(io::ErrorKind::PermissionDenied), || {
            StoreError::RowDoesNotExist("r1".into())
        });
        assert!(matches!(denied, StoreError::Io(_)));

        let taken = exists_or(io::Error::from(io::ErrorKind::AlreadyExists), || {
            StoreError::TableAlreadyExists("t1".into())
        });
        assert!(matches!(taken, StoreError::TableAlreadyExists(_)));
    }
}
