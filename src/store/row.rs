//! A single row: one file, one lock, one attribute mapping
//!
//! # Lock discipline
//!
//! A row is opened with a [`LockMode`]. Between calls it holds exactly that
//! mode's state. `load()` needs at least a shared lock and `save()` an
//! exclusive one; both take what they need for the duration of the call and
//! then return to the state held before it.
//!
//! | held before save | during write | held after save |
//! |------------------|--------------|-----------------|
//! | unlocked         | exclusive    | unlocked        |
//! | shared           | exclusive    | shared          |
//! | exclusive        | exclusive    | exclusive       |
//!
//! # Replacing files
//!
//! `save()` never writes into the row file. It writes a temporary file in
//! the table directory, locks it exclusively, and renames it over the row.
//! A crash leaves either the old or the new content. Since the rename swaps
//! inodes, every acquisition checks that the locked handle is still the file
//! at the row path and re-opens it otherwise.

use std::fmt;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::{Builder, NamedTempFile};

use super::errors::{not_found_or, StoreError, StoreResult};
use super::names;
use super::options::StoreContext;
use crate::codec::{self, Attributes, Value};
use crate::lock::{self, Lock, LockError, LockMode, LockState};
use crate::observability::{log_event_with_fields, Event};

/// One open row.
///
/// Dropping a row releases its lock and closes its file; [`Row::close`]
/// does the same but reports errors.
pub struct Row {
    key: String,
    path: PathBuf,
    dir: PathBuf,
    lock: Lock,
    mode: LockMode,
    writable: bool,
    attributes: Attributes,
    ctx: Arc<StoreContext>,
}

impl Row {
    /// Open the row `key` inside table directory `dir` and load it.
    pub(crate) fn open(
        dir: &Path,
        key: &str,
        mode: LockMode,
        writable: bool,
        ctx: Arc<StoreContext>,
    ) -> StoreResult<Self> {
        names::validate(key)?;
        let path = dir.join(key);
        let file = File::open(&path)
            .map_err(|e| not_found_or(e, || StoreError::RowDoesNotExist(key.to_string())))?;

        let mut row = Self {
            key: key.to_string(),
            path,
            dir: dir.to_path_buf(),
            lock: Lock::new(file),
            mode: LockMode::None,
            writable,
            attributes: Attributes::new(),
            ctx,
        };
        row.set_mode(mode)?;
        row.load()?;
        Ok(row)
    }

    /// Read the row file and merge its attributes into this row.
    ///
    /// Attributes present in memory but not on disk are kept.
    pub fn load(&mut self) -> StoreResult<()> {
        let text = {
            let mut guard = self.lock.scoped_shared()?;
            if guard.restores_to() == LockState::Unlocked {
                self.ctx.metrics.increment_shared_acquisitions();
            }
            follow_current(&mut guard, &self.path, &self.key)?;

            let mut file: &File = guard.file();
            let mut text = String::new();
            file.seek(SeekFrom::Start(0))?;
            file.read_to_string(&mut text)?;

            guard.finish()?;
            text
        };

        let decoded = codec::decode(&text)?;
        self.attributes.extend(decoded);

        self.ctx.metrics.increment_rows_loaded();
        log_event_with_fields(Event::RowLoaded, &[("key", &self.key)]);
        Ok(())
    }

    /// Encode the attributes and replace the row file with them.
    ///
    /// The lock state held before the call is held again afterwards. Once the
    /// rename succeeds the new content is in place; a failed directory sync
    /// after that point is logged, not returned. An error from restoring the
    /// prior lock state can still follow a completed rename.
    pub fn save(&mut self) -> StoreResult<()> {
        if !self.writable {
            return Err(StoreError::ReadOnlyRow(self.key.clone()));
        }
        if self.lock.is_poisoned() {
            return Err(LockError::Poisoned.into());
        }

        let text = codec::encode(&self.attributes)?;
        let sync = self.ctx.options.sync_writes;

        let mut guard = self.lock.scoped_exclusive()?;
        if guard.restores_to() != LockState::Exclusive {
            self.ctx.metrics.increment_exclusive_acquisitions();
        }
        follow_current(&mut guard, &self.path, &self.key)?;

        let staged = stage(&self.dir, text.as_bytes(), sync)?;
        lock::lock_exclusive(staged.as_file())?;
        let file = staged.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        guard.replace_exclusive(file);
        if sync {
            sync_published(&self.dir, &self.key);
        }
        guard.finish()?;

        self.ctx.metrics.record_save(text.len() as u64);
        log_event_with_fields(
            Event::RowSaved,
            &[("bytes", &text.len().to_string()), ("key", &self.key)],
        );
        Ok(())
    }

    /// Move to the state of `mode` and keep it between calls.
    pub fn set_mode(&mut self, mode: LockMode) -> StoreResult<()> {
        match mode {
            LockMode::None => self.lock.release()?,
            LockMode::Shared => {
                if self.lock.state() != LockState::Shared {
                    self.lock.acquire_shared()?;
                    self.ctx.metrics.increment_shared_acquisitions();
                }
            }
            LockMode::Exclusive => {
                if self.lock.state() != LockState::Exclusive {
                    self.lock.acquire_exclusive()?;
                    self.ctx.metrics.increment_exclusive_acquisitions();
                }
            }
        }
        if mode != LockMode::None {
            follow_current(&mut self.lock, &self.path, &self.key)?;
            log_event_with_fields(
                Event::LockAcquired,
                &[("key", &self.key), ("mode", mode.as_str())],
            );
        }
        self.mode = mode;
        Ok(())
    }

    /// Drop any held lock. Later saves take a transient exclusive lock.
    pub fn release_lock(&mut self) -> StoreResult<()> {
        self.set_mode(LockMode::None)?;
        log_event_with_fields(Event::LockReleased, &[("key", &self.key)]);
        Ok(())
    }

    /// Release the lock and close the file, reporting failure.
    pub fn close(mut self) -> StoreResult<()> {
        self.lock.release()?;
        Ok(())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the row was last put in
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// What the row's handle currently holds
    pub fn lock_state(&self) -> LockState {
        self.lock.state()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Creation time of the current row file.
    ///
    /// Every save replaces the file, so on filesystems that record birth
    /// time this is the time of the last save. Falls back to the
    /// modification time where birth time is not recorded.
    pub fn created(&self) -> StoreResult<DateTime<Utc>> {
        let meta = self.metadata()?;
        let t = meta.created().or_else(|_| meta.modified())?;
        Ok(DateTime::<Utc>::from(t))
    }

    /// Modification time of the current row file
    pub fn modified(&self) -> StoreResult<DateTime<Utc>> {
        let t = self.metadata()?.modified()?;
        Ok(DateTime::<Utc>::from(t))
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute in memory, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attributes.insert(name.into(), value.into())
    }

    /// Remove an attribute from memory, returning it
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    fn metadata(&self) -> StoreResult<fs::Metadata> {
        fs::metadata(&self.path)
            .map_err(|e| not_found_or(e, || StoreError::RowDoesNotExist(self.key.clone())))
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("state", &self.lock.state())
            .field("writable", &self.writable)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<Row {}>", self.key)?;
        match codec::to_json(&self.attributes)
            .ok()
            .and_then(|json| serde_json::to_string_pretty(&json).ok())
        {
            Some(pretty) => write!(f, "{}", pretty),
            None => write!(f, "{:?}", self.attributes),
        }
    }
}

/// Make sure `lock` is on the file currently at `path`, following any
/// replacement. A missing path means the row was removed.
fn follow_current(lock: &mut Lock, path: &Path, key: &str) -> StoreResult<()> {
    let missing = || StoreError::RowDoesNotExist(key.to_string());
    loop {
        match lock.refers_to(path) {
            Ok(true) => return Ok(()),
            Ok(false) => {
                log_event_with_fields(Event::RowReopened, &[("key", key)]);
                match lock.reopen(path) {
                    Ok(()) => {}
                    Err(LockError::Io(e)) => return Err(not_found_or(e, missing)),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(not_found_or(e, missing)),
        }
    }
}

/// Write `contents` to a new hidden temporary file in `dir`.
pub(crate) fn stage(dir: &Path, contents: &[u8], sync: bool) -> StoreResult<NamedTempFile> {
    let mut staged = Builder::new().prefix(".row-").suffix(".tmp").tempfile_in(dir)?;
    staged.write_all(contents)?;
    staged.flush()?;
    if sync {
        staged.as_file().sync_all()?;
    }
    Ok(staged)
}

#[cfg(unix)]
pub(crate) fn sync_dir(dir: &Path) -> StoreResult<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_dir(_dir: &Path) -> StoreResult<()> {
    Ok(())
}

/// Sync `dir` after a file was renamed into it.
///
/// The rename already published the file, so a failure here only weakens
/// durability and is reported as an event.
pub(crate) fn sync_published(dir: &Path, key: &str) {
    if let Err(e) = sync_dir(dir) {
        log_event_with_fields(
            Event::DirSyncFailed,
            &[("error", &e.to_string()), ("key", key)],
        );
    }
}
