//! Metrics registry for dirdb
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Shared by a manager and every handle it gives out

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters.
///
/// Relaxed ordering everywhere; counters are exact but not synchronized
/// with each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    databases_created: AtomicU64,
    tables_created: AtomicU64,
    rows_created: AtomicU64,
    rows_loaded: AtomicU64,
    rows_saved: AtomicU64,
    rows_removed: AtomicU64,
    bytes_written: AtomicU64,
    unique_key_collisions: AtomicU64,
    shared_acquisitions: AtomicU64,
    exclusive_acquisitions: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_databases_created(&self) {
        self.databases_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_tables_created(&self) {
        self.tables_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows_created(&self) {
        self.rows_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rows_loaded(&self) {
        self.rows_loaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one save of `bytes` bytes
    pub fn record_save(&self, bytes: u64) {
        self.rows_saved.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_rows_removed(&self) {
        self.rows_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unique_key_collisions(&self) {
        self.unique_key_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_shared_acquisitions(&self) {
        self.shared_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_exclusive_acquisitions(&self) {
        self.exclusive_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            databases_created: self.databases_created.load(Ordering::Relaxed),
            tables_created: self.tables_created.load(Ordering::Relaxed),
            rows_created: self.rows_created.load(Ordering::Relaxed),
            rows_loaded: self.rows_loaded.load(Ordering::Relaxed),
            rows_saved: self.rows_saved.load(Ordering::Relaxed),
            rows_removed: self.rows_removed.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            unique_key_collisions: self.unique_key_collisions.load(Ordering::Relaxed),
            shared_acquisitions: self.shared_acquisitions.load(Ordering::Relaxed),
            exclusive_acquisitions: self.exclusive_acquisitions.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub databases_created: u64,
    pub tables_created: u64,
    pub rows_created: u64,
    pub rows_loaded: u64,
    pub rows_saved: u64,
    pub rows_removed: u64,
    pub bytes_written: u64,
    pub unique_key_collisions: u64,
    pub shared_acquisitions: u64,
    pub exclusive_acquisitions: u64,
}
