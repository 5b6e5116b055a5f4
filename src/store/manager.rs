//! Entry point: the data directory and its databases

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::database::Database;
use super::errors::{exists_or, not_found_or, StoreError, StoreResult};
use super::names::{self, LOCK_FILE};
use super::options::{StoreContext, StoreOptions};
use crate::lock::Lock;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

/// Owns a data directory. Every database, table and row opened through a
/// manager shares its options and metrics.
#[derive(Debug, Clone)]
pub struct Manager {
    data_dir: PathBuf,
    ctx: Arc<StoreContext>,
}

impl Manager {
    /// Open `data_dir` with default options, creating it if needed
    pub fn new(data_dir: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::with_options(data_dir, StoreOptions::default())
    }

    pub fn with_options(data_dir: impl Into<PathBuf>, options: StoreOptions) -> StoreResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            ctx: StoreContext::new(options),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn options(&self) -> &StoreOptions {
        &self.ctx.options
    }

    /// Counters shared by everything this manager opened
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.ctx.metrics
    }

    /// Create a database directory with its `.lock` and open it
    pub fn create_database(&self, name: &str) -> StoreResult<Database> {
        names::validate(name)?;
        let dir = self.data_dir.join(name);
        fs::create_dir(&dir)
            .map_err(|e| exists_or(e, || StoreError::DatabaseAlreadyExists(name.to_string())))?;
        Lock::open(&dir.join(LOCK_FILE))?;

        self.ctx.metrics.increment_databases_created();
        log_event_with_fields(Event::DatabaseCreated, &[("database", name)]);
        self.database(name)
    }

    /// Delete a database with all of its tables and rows
    pub fn remove_database(&self, name: &str) -> StoreResult<()> {
        names::validate(name)?;
        fs::remove_dir_all(self.data_dir.join(name))
            .map_err(|e| not_found_or(e, || StoreError::DatabaseDoesNotExist(name.to_string())))?;

        log_event_with_fields(Event::DatabaseRemoved, &[("database", name)]);
        Ok(())
    }

    /// Open an existing database
    pub fn database(&self, name: &str) -> StoreResult<Database> {
        Database::open(&self.data_dir, name, Arc::clone(&self.ctx))
    }

    pub fn database_exists(&self, name: &str) -> StoreResult<bool> {
        names::validate(name)?;
        Ok(self.data_dir.join(name).is_dir())
    }

    /// Sorted names of all databases
    pub fn databases(&self) -> StoreResult<Vec<String>> {
        let mut databases = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = names::visible(&entry.file_name()) {
                databases.push(name);
            }
        }
        databases.sort();
        Ok(databases)
    }
}
