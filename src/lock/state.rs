//! Lock states and requested lock modes

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What a handle currently believes it holds.
///
/// This is a local, cooperative belief about the handle's own advisory lock.
/// It says nothing about locks held through other handles or processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Shared,
    Exclusive,
}

impl LockState {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Unlocked => "unlocked",
            LockState::Shared => "shared",
            LockState::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lock discipline requested when a row is opened.
///
/// - `None`: no lock is held between operations; reads take a transient
///   shared lock and saves a transient exclusive lock.
/// - `Shared`: a shared lock is held for the lifetime of the row.
/// - `Exclusive`: an exclusive lock is held for the lifetime of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockMode {
    #[default]
    None,
    Shared,
    Exclusive,
}

impl LockMode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::None => "none",
            LockMode::Shared => "shared",
            LockMode::Exclusive => "exclusive",
        }
    }

    /// The state a handle holds between operations under this mode
    pub fn held_state(&self) -> LockState {
        match self {
            LockMode::None => LockState::Unlocked,
            LockMode::Shared => LockState::Shared,
            LockMode::Exclusive => LockState::Exclusive,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unrecognized lock mode name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lock mode '{0}', expected none, shared or exclusive")]
pub struct ParseLockModeError(pub String);

impl FromStr for LockMode {
    type Err = ParseLockModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(LockMode::None),
            "shared" => Ok(LockMode::Shared),
            "exclusive" => Ok(LockMode::Exclusive),
            _ => Err(ParseLockModeError(s.to_string())),
        }
    }
}
