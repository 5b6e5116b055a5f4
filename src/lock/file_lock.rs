//! Advisory lock over a single open file handle
//!
//! `flock(2)` locks belong to the open file description, so two `Lock`s
//! opened independently on the same path coordinate with each other even
//! inside one process, exactly as they would across processes.

use std::fs::{File, OpenOptions};
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use fs2::FileExt;

use super::errors::{LockError, LockResult};
use super::state::LockState;
use crate::observability::{log_event_with_fields, Event};

/// One open file handle plus the state this handle believes it holds.
///
/// All acquisitions block indefinitely. Dropping the lock releases it.
#[derive(Debug)]
pub struct Lock {
    file: File,
    state: LockState,
    poisoned: bool,
}

impl Lock {
    /// Wrap an already opened handle. The handle starts unlocked.
    pub fn new(file: File) -> Self {
        Self {
            file,
            state: LockState::Unlocked,
            poisoned: false,
        }
    }

    /// Open (creating if missing) a dedicated lock file such as `.lock`.
    pub fn open(path: &Path) -> LockResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self::new(file))
    }

    /// Current state belief
    pub fn state(&self) -> LockState {
        self.state
    }

    /// True once a transition failed halfway; every later call fails.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// The wrapped handle
    pub fn file(&self) -> &File {
        &self.file
    }

    /// Block until a shared lock is held.
    ///
    /// From `Exclusive` this downgrades in a single call.
    pub fn acquire_shared(&mut self) -> LockResult<()> {
        self.check()?;
        if self.state == LockState::Shared {
            return Ok(());
        }
        let from = self.state;
        let result = FileExt::lock_shared(&self.file);
        self.transition(from, result)?;
        self.state = LockState::Shared;
        Ok(())
    }

    /// Block until an exclusive lock is held.
    ///
    /// From `Shared` this upgrades in a single call; there is no explicit
    /// release in between.
    pub fn acquire_exclusive(&mut self) -> LockResult<()> {
        self.check()?;
        if self.state == LockState::Exclusive {
            return Ok(());
        }
        let from = self.state;
        let result = FileExt::lock_exclusive(&self.file);
        self.transition(from, result)?;
        self.state = LockState::Exclusive;
        Ok(())
    }

    /// Release whatever is held. Releasing an unlocked handle is a no-op.
    pub fn release(&mut self) -> LockResult<()> {
        self.check()?;
        if self.state == LockState::Unlocked {
            return Ok(());
        }
        let from = self.state;
        let result = FileExt::unlock(&self.file);
        self.transition(from, result)?;
        self.state = LockState::Unlocked;
        Ok(())
    }

    /// Hold at least a shared lock until the guard goes away.
    ///
    /// The guard restores the state held before this call.
    pub fn scoped_shared(&mut self) -> LockResult<LockGuard<'_>> {
        let restore = self.state;
        if restore == LockState::Unlocked {
            self.acquire_shared()?;
        } else {
            self.check()?;
        }
        Ok(LockGuard::new(self, restore))
    }

    /// Hold an exclusive lock until the guard goes away.
    ///
    /// The guard restores the state held before this call: an unlocked
    /// handle is released again, a shared one is downgraded back.
    pub fn scoped_exclusive(&mut self) -> LockResult<LockGuard<'_>> {
        let restore = self.state;
        self.acquire_exclusive()?;
        Ok(LockGuard::new(self, restore))
    }

    /// Whether this handle still refers to the file currently at `path`.
    ///
    /// Fails with `NotFound` if nothing is at `path` any more.
    pub fn refers_to(&self, path: &Path) -> io::Result<bool> {
        let on_disk = std::fs::metadata(path)?;
        let held = self.file.metadata()?;
        Ok(same_file(&held, &on_disk))
    }

    /// Re-open `path` and take the same lock state on the fresh handle.
    ///
    /// The old handle is closed (and its lock released) only after the new
    /// one is locked.
    pub fn reopen(&mut self, path: &Path) -> LockResult<()> {
        self.check()?;
        let file = File::open(path)?;
        match self.state {
            LockState::Unlocked => {}
            LockState::Shared => FileExt::lock_shared(&file)?,
            LockState::Exclusive => FileExt::lock_exclusive(&file)?,
        }
        self.file = file;
        Ok(())
    }

    /// Swap in a handle the caller has already locked exclusively.
    pub(crate) fn replace_exclusive(&mut self, file: File) {
        self.file = file;
        self.state = LockState::Exclusive;
    }

    fn check(&self) -> LockResult<()> {
        if self.poisoned {
            return Err(LockError::Poisoned);
        }
        Ok(())
    }

    // A failed flock from an unlocked handle leaves it unlocked. From any
    // other state the kernel may already have dropped the old lock.
    fn transition(&mut self, from: LockState, result: io::Result<()>) -> LockResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                if from != LockState::Unlocked {
                    self.poison(&e.to_string());
                }
                Err(LockError::Io(e))
            }
        }
    }

    fn poison(&mut self, reason: &str) {
        self.poisoned = true;
        log_event_with_fields(
            Event::LockStatePoisoned,
            &[("reason", reason), ("state", self.state.as_str())],
        );
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        if self.state != LockState::Unlocked {
            let _ = FileExt::unlock(&self.file);
        }
    }
}

/// Lock exclusively a handle that is not yet wrapped by a `Lock`.
pub(crate) fn lock_exclusive(file: &File) -> LockResult<()> {
    FileExt::lock_exclusive(file)?;
    Ok(())
}

#[cfg(unix)]
fn same_file(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_file(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    a.len() == b.len() && a.modified().ok() == b.modified().ok()
}

/// Restores a lock's previous state when dropped.
///
/// Use [`LockGuard::finish`] to observe a failed restore; a failure during
/// drop poisons the lock instead.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a mut Lock,
    restore: LockState,
    done: bool,
}

impl<'a> LockGuard<'a> {
    fn new(lock: &'a mut Lock, restore: LockState) -> Self {
        Self {
            lock,
            restore,
            done: false,
        }
    }

    /// The state the guard returns to
    pub fn restores_to(&self) -> LockState {
        self.restore
    }

    /// Restore the previous state now, reporting failure.
    pub fn finish(mut self) -> LockResult<()> {
        self.done = true;
        restore(self.lock, self.restore)
    }
}

fn restore(lock: &mut Lock, to: LockState) -> LockResult<()> {
    match to {
        LockState::Unlocked => lock.release(),
        LockState::Shared => lock.acquire_shared(),
        LockState::Exclusive => lock.acquire_exclusive(),
    }
}

impl Deref for LockGuard<'_> {
    type Target = Lock;

    fn deref(&self) -> &Lock {
        self.lock
    }
}

impl DerefMut for LockGuard<'_> {
    fn deref_mut(&mut self) -> &mut Lock {
        self.lock
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Err(e) = restore(self.lock, self.restore) {
            if !self.lock.poisoned {
                self.lock.poison(&e.to_string());
            }
        }
    }
}
