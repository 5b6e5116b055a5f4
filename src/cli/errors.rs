//! CLI-specific error types
//!
//! Store errors keep their own `DIRDB_*` code so scripts see the same codes
//! the library reports.

use std::fmt;
use std::io;

use crate::codec::CodecError;
use crate::observability::Severity;
use crate::store::StoreError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Malformed command input
    InvalidInput,
    /// Error reported by the store, with its code
    Store(&'static str),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DIRDB_CLI_CONFIG_ERROR",
            Self::IoError => "DIRDB_CLI_IO_ERROR",
            Self::InvalidInput => "DIRDB_CLI_INVALID_INPUT",
            Self::Store(code) => code,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    severity: Severity,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Invalid input
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Severity the failure is logged at
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_input(format!("JSON error: {}", e))
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self {
            severity: e.severity(),
            ..Self::new(CliErrorCode::Store(e.code()), e.to_string())
        }
    }
}

impl From<CodecError> for CliError {
    fn from(e: CodecError) -> Self {
        Self::new(CliErrorCode::Store(e.code()), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_code_passes_through() {
        let err = CliError::from(StoreError::RowDoesNotExist("r1".into()));
        assert_eq!(err.code_str(), "DIRDB_ROW_DOES_NOT_EXIST");
        assert_eq!(err.message(), "row does not exist: r1");
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_lock_state_failure_stays_fatal() {
        let err = CliError::from(StoreError::InvalidLockState("poisoned".into()));
        assert_eq!(err.code_str(), "DIRDB_INVALID_LOCK_STATE");
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_display() {
        let err = CliError::config_error("data_dir is required");
        assert_eq!(err.to_string(), "DIRDB_CLI_CONFIG_ERROR: data_dir is required");
    }
}
