//! Observable events for dirdb
//!
//! Events are explicit and typed. Each maps to a fixed upper-case name used
//! as the `event` field of a log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in dirdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// CLI configuration loaded
    ConfigLoaded,
    /// CLI command failed; logged at the failure's own severity
    CommandFailed,

    // Databases
    DatabaseCreated,
    DatabaseRemoved,

    // Tables
    TableCreated,
    TableRemoved,

    // Rows
    RowCreated,
    RowLoaded,
    RowSaved,
    RowRemoved,
    /// Row handle followed a file replaced by another writer
    RowReopened,
    /// Directory sync after a rename failed; the file is already in place
    DirSyncFailed,

    // Key generation
    /// Random key already taken, retrying
    UniqueKeyCollision,
    /// Retry budget spent without finding a free key
    UniqueKeyExhausted,

    // Locking
    LockAcquired,
    LockReleased,
    /// A lock transition failed halfway (FATAL)
    LockStatePoisoned,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CommandFailed => "COMMAND_FAILED",

            Event::DatabaseCreated => "DATABASE_CREATED",
            Event::DatabaseRemoved => "DATABASE_REMOVED",

            Event::TableCreated => "TABLE_CREATED",
            Event::TableRemoved => "TABLE_REMOVED",

            Event::RowCreated => "ROW_CREATED",
            Event::RowLoaded => "ROW_LOADED",
            Event::RowSaved => "ROW_SAVED",
            Event::RowRemoved => "ROW_REMOVED",
            Event::RowReopened => "ROW_REOPENED",
            Event::DirSyncFailed => "DIR_SYNC_FAILED",

            Event::UniqueKeyCollision => "UNIQUE_KEY_COLLISION",
            Event::UniqueKeyExhausted => "UNIQUE_KEY_EXHAUSTED",

            Event::LockAcquired => "LOCK_ACQUIRED",
            Event::LockReleased => "LOCK_RELEASED",
            Event::LockStatePoisoned => "LOCK_STATE_POISONED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::LockStatePoisoned => Severity::Fatal,
            Event::UniqueKeyExhausted | Event::CommandFailed => Severity::Error,
            Event::UniqueKeyCollision | Event::DirSyncFailed => Severity::Warn,
            Event::RowReopened => Severity::Info,
            Event::LockAcquired | Event::LockReleased | Event::RowLoaded => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::ConfigLoaded,
            Event::CommandFailed,
            Event::DatabaseCreated,
            Event::DatabaseRemoved,
            Event::TableCreated,
            Event::TableRemoved,
            Event::RowCreated,
            Event::RowLoaded,
            Event::RowSaved,
            Event::RowRemoved,
            Event::RowReopened,
            Event::DirSyncFailed,
            Event::UniqueKeyCollision,
            Event::UniqueKeyExhausted,
            Event::LockAcquired,
            Event::LockReleased,
            Event::LockStatePoisoned,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severities() {
        assert_eq!(Event::LockStatePoisoned.severity(), Severity::Fatal);
        assert_eq!(Event::UniqueKeyExhausted.severity(), Severity::Error);
        assert_eq!(Event::DirSyncFailed.severity(), Severity::Warn);
        assert_eq!(Event::RowSaved.severity(), Severity::Info);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::RowCreated), "ROW_CREATED");
    }
}
