//! Store options and the context shared by every handle

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observability::MetricsRegistry;

/// Tunables for a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// How many random keys `create_row_with_unique_key` tries before
    /// giving up
    #[serde(default = "default_unique_key_attempts")]
    pub unique_key_attempts: u32,

    /// fsync row files (and their directory) on every save
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_unique_key_attempts() -> u32 {
    100
}

fn default_sync_writes() -> bool {
    true
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            unique_key_attempts: default_unique_key_attempts(),
            sync_writes: default_sync_writes(),
        }
    }
}

/// Options plus counters, shared by a manager and everything it opens
#[derive(Debug, Default)]
pub(crate) struct StoreContext {
    pub(crate) options: StoreOptions,
    pub(crate) metrics: Arc<MetricsRegistry>,
}

impl StoreContext {
    pub(crate) fn new(options: StoreOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }
}
