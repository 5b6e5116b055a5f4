//! Databases: a directory of tables plus a `.lock`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::{exists_or, not_found_or, StoreError, StoreResult};
use super::names::{self, LOCK_FILE};
use super::options::StoreContext;
use super::table::Table;
use crate::lock::{Lock, LockError};
use crate::observability::{log_event_with_fields, Event};

/// An open database
#[derive(Debug)]
pub struct Database {
    name: String,
    dir: PathBuf,
    lock: Lock,
    ctx: Arc<StoreContext>,
}

impl Database {
    pub(crate) fn open(data_dir: &Path, name: &str, ctx: Arc<StoreContext>) -> StoreResult<Self> {
        names::validate(name)?;
        let dir = data_dir.join(name);
        let missing = || StoreError::DatabaseDoesNotExist(name.to_string());
        if !dir.is_dir() {
            return Err(missing());
        }
        let lock = Lock::open(&dir.join(LOCK_FILE)).map_err(|e| match e {
            LockError::Io(io) => not_found_or(io, missing),
            other => other.into(),
        })?;

        Ok(Self {
            name: name.to_string(),
            dir,
            lock,
            ctx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The database's `.lock` handle
    pub fn lock_mut(&mut self) -> &mut Lock {
        &mut self.lock
    }

    /// Create a table directory with its `.lock` and open it
    pub fn create_table(&mut self, name: &str) -> StoreResult<Table> {
        names::validate(name)?;
        let dir = self.dir.join(name);

        let guard = self.lock.scoped_exclusive()?;
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::DatabaseDoesNotExist(self.name.clone()),
            _ => exists_or(e, || StoreError::TableAlreadyExists(name.to_string())),
        })?;
        Lock::open(&dir.join(LOCK_FILE))?;
        guard.finish()?;

        self.ctx.metrics.increment_tables_created();
        log_event_with_fields(
            Event::TableCreated,
            &[("database", &self.name), ("table", name)],
        );
        self.table(name)
    }

    /// Delete a table and every row in it.
    ///
    /// Rows open elsewhere keep their handles; their next save fails with
    /// `RowDoesNotExist` or an I/O error.
    pub fn remove_table(&mut self, name: &str) -> StoreResult<()> {
        names::validate(name)?;
        let dir = self.dir.join(name);

        let guard = self.lock.scoped_exclusive()?;
        fs::remove_dir_all(&dir)
            .map_err(|e| not_found_or(e, || StoreError::TableDoesNotExist(name.to_string())))?;
        guard.finish()?;

        log_event_with_fields(
            Event::TableRemoved,
            &[("database", &self.name), ("table", name)],
        );
        Ok(())
    }

    /// Open an existing table
    pub fn table(&self, name: &str) -> StoreResult<Table> {
        Table::open(&self.dir, &self.name, name, Arc::clone(&self.ctx))
    }

    pub fn table_exists(&self, name: &str) -> StoreResult<bool> {
        names::validate(name)?;
        Ok(self.dir.join(name).is_dir())
    }

    /// Sorted names of all tables
    pub fn tables(&self) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| not_found_or(e, || StoreError::DatabaseDoesNotExist(self.name.clone())))?;

        let mut tables = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = names::visible(&entry.file_name()) {
                tables.push(name);
            }
        }
        tables.sort();
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lock::{LockMode, LockState};
    use crate::store::options::StoreOptions;
    use tempfile::TempDir;

    fn open_db(dir: &TempDir) -> Database {
        fs::create_dir(dir.path().join("db")).unwrap();
        let options = StoreOptions {
            sync_writes: false,
            ..StoreOptions::default()
        };
        Database::open(dir.path(), "db", StoreContext::new(options)).unwrap()
    }

    #[test]
    fn test_open_missing_database() {
        let dir = TempDir::new().unwrap();
        let result = Database::open(dir.path(), "nope", StoreContext::new(StoreOptions::default()));
        assert!(matches!(result, Err(StoreError::DatabaseDoesNotExist(n)) if n == "nope"));
    }

    #[test]
    fn test_create_table_layout() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);

        let table = db.create_table("t1").unwrap();
        assert_eq!(table.name(), "t1");
        assert_eq!(table.database(), "db");
        assert!(dir.path().join("db").join("t1").join(LOCK_FILE).is_file());
        assert_eq!(db.lock_mut().state(), LockState::Unlocked);
    }

    #[test]
    fn test_create_table_twice_fails() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);

        db.create_table("t1").unwrap();
        assert!(matches!(
            db.create_table("t1"),
            Err(StoreError::TableAlreadyExists(n)) if n == "t1"
        ));
    }

    #[test]
    fn test_remove_table_removes_rows() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);

        let mut table = db.create_table("t1").unwrap();
        table.create_row("r1", LockMode::None).unwrap();
        drop(table);

        db.remove_table("t1").unwrap();
        assert!(!db.table_exists("t1").unwrap());
        assert!(matches!(db.table("t1"), Err(StoreError::TableDoesNotExist(_))));
        assert!(matches!(
            db.remove_table("t1"),
            Err(StoreError::TableDoesNotExist(_))
        ));
    }

    #[test]
    fn test_tables_sorted_without_lock_file() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);

        db.create_table("zeta").unwrap();
        db.create_table("alpha").unwrap();
        assert_eq!(db.tables().unwrap(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_invalid_table_name() {
        let dir = TempDir::new().unwrap();
        let mut db = open_db(&dir);
        assert!(matches!(
            db.create_table("a/b"),
            Err(StoreError::InvalidName { .. })
        ));
    }
}
