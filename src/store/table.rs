//! Tables: a directory of row files plus a `.lock`
//!
//! The table lock is used for one thing only: making "check the key is free,
//! then write the empty row" atomic against other creators. Reading,
//! saving and removing rows never touch it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::{exists_or, not_found_or, StoreError, StoreResult};
use super::names::{self, LOCK_FILE};
use super::options::StoreContext;
use super::row::{self, Row};
use crate::lock::{Lock, LockError, LockMode};
use crate::observability::{log_event_with_fields, Event};

/// Content of a freshly created row
const EMPTY_ROW: &[u8] = b"{}";

/// An open table
#[derive(Debug)]
pub struct Table {
    database: String,
    name: String,
    dir: PathBuf,
    lock: Lock,
    ctx: Arc<StoreContext>,
}

impl Table {
    pub(crate) fn open(
        db_dir: &Path,
        database: &str,
        name: &str,
        ctx: Arc<StoreContext>,
    ) -> StoreResult<Self> {
        names::validate(name)?;
        let dir = db_dir.join(name);
        let missing = || StoreError::TableDoesNotExist(name.to_string());
        if !dir.is_dir() {
            return Err(missing());
        }
        let lock = Lock::open(&dir.join(LOCK_FILE)).map_err(|e| match e {
            LockError::Io(io) => not_found_or(io, missing),
            other => other.into(),
        })?;

        Ok(Self {
            database: database.to_string(),
            name: name.to_string(),
            dir,
            lock,
            ctx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning database
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The table's `.lock` handle
    pub fn lock_mut(&mut self) -> &mut Lock {
        &mut self.lock
    }

    /// Open an existing row with the given lock mode
    pub fn get_row(&self, key: &str, mode: LockMode) -> StoreResult<Row> {
        Row::open(&self.dir, key, mode, true, Arc::clone(&self.ctx))
    }

    /// Open an existing row without a lock; `save()` on it fails
    pub fn get_read_only(&self, key: &str) -> StoreResult<Row> {
        Row::open(&self.dir, key, LockMode::None, false, Arc::clone(&self.ctx))
    }

    /// Open an existing row holding an exclusive lock until it is released
    pub fn get_locked(&self, key: &str) -> StoreResult<Row> {
        self.get_row(key, LockMode::Exclusive)
    }

    /// Create an empty row and open it with the given lock mode.
    ///
    /// Fails with `RowAlreadyExists` if `key` is taken.
    pub fn create_row(&mut self, key: &str, mode: LockMode) -> StoreResult<Row> {
        names::validate(key)?;
        let path = self.dir.join(key);
        let taken = || StoreError::RowAlreadyExists(key.to_string());

        let guard = self.lock.scoped_exclusive()?;

        if path.exists() {
            return Err(taken());
        }
        let staged = row::stage(&self.dir, EMPTY_ROW, self.ctx.options.sync_writes)?;
        staged
            .persist_noclobber(&path)
            .map_err(|e| exists_or(e.error, taken))?;
        if self.ctx.options.sync_writes {
            row::sync_published(&self.dir, key);
        }

        let row = Row::open(&self.dir, key, mode, true, Arc::clone(&self.ctx))?;
        guard.finish()?;

        self.ctx.metrics.increment_rows_created();
        log_event_with_fields(
            Event::RowCreated,
            &[("key", key), ("table", &self.name)],
        );
        Ok(row)
    }

    /// Create a row under a random alphanumeric key of `length` characters.
    ///
    /// Retries on collision up to the configured attempt budget.
    pub fn create_row_with_unique_key(&mut self, length: usize, mode: LockMode) -> StoreResult<Row> {
        if length == 0 {
            return Err(StoreError::InvalidName {
                name: String::new(),
                reason: "generated key length must be positive",
            });
        }

        let attempts = self.ctx.options.unique_key_attempts.max(1);
        for _ in 0..attempts {
            let key = names::random_key(length);
            match self.create_row(&key, mode) {
                Ok(row) => return Ok(row),
                Err(StoreError::RowAlreadyExists(_)) => {
                    self.ctx.metrics.increment_unique_key_collisions();
                    log_event_with_fields(
                        Event::UniqueKeyCollision,
                        &[("key", &key), ("table", &self.name)],
                    );
                }
                Err(e) => return Err(e),
            }
        }

        log_event_with_fields(
            Event::UniqueKeyExhausted,
            &[
                ("attempts", &attempts.to_string()),
                ("length", &length.to_string()),
                ("table", &self.name),
            ],
        );
        Err(StoreError::UniqueKeyExhausted { length, attempts })
    }

    /// Unlink a row file. No lock is taken.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        names::validate(key)?;
        fs::remove_file(self.dir.join(key))
            .map_err(|e| not_found_or(e, || StoreError::RowDoesNotExist(key.to_string())))?;

        self.ctx.metrics.increment_rows_removed();
        log_event_with_fields(
            Event::RowRemoved,
            &[("key", key), ("table", &self.name)],
        );
        Ok(())
    }

    /// Whether a row file exists for `key`
    pub fn exists(&self, key: &str) -> StoreResult<bool> {
        names::validate(key)?;
        Ok(self.dir.join(key).is_file())
    }

    /// Sorted keys of all rows
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| not_found_or(e, || StoreError::TableDoesNotExist(self.name.clone())))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = names::visible(&entry.file_name()) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
