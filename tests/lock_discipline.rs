//! Lock Discipline Tests
//!
//! Rows are coordinated only by advisory locks on their files:
//! - Two exclusive holders never overlap
//! - Shared holders coexist, and an exclusive request waits for all of them
//! - `save()` leaves the caller holding what it held before, on the new file
//! - Concurrent read-modify-write under exclusive locks loses no update

use dirdb::{LockMode, LockState, Manager, StoreOptions, Table, Value};
use fs2::FileExt;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_store() -> (TempDir, Manager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let options = StoreOptions {
        sync_writes: false,
        ..StoreOptions::default()
    };
    let manager = Manager::with_options(temp_dir.path(), options).unwrap();
    let mut db = manager.create_database("db1").unwrap();
    let mut table = db.create_table("t1").unwrap();
    table.create_row("r1", LockMode::None).unwrap();
    (temp_dir, manager)
}

fn open_table(manager: &Manager) -> Table {
    manager.database("db1").unwrap().table("t1").unwrap()
}

/// Open the row file through an unrelated handle
fn outside_handle(temp_dir: &TempDir) -> File {
    File::open(temp_dir.path().join("db1/t1/r1")).unwrap()
}

// =============================================================================
// Mutual Exclusion
// =============================================================================

/// A second exclusive request blocks until the first holder lets go.
#[test]
fn test_exclusive_holders_never_overlap() {
    let (_temp_dir, manager) = create_store();
    let released = Arc::new(AtomicBool::new(false));

    let holder = open_table(&manager).get_locked("r1").unwrap();

    let waiter = {
        let manager = manager.clone();
        let released = Arc::clone(&released);
        thread::spawn(move || {
            let row = open_table(&manager).get_locked("r1").unwrap();
            let saw_release = released.load(Ordering::SeqCst);
            row.close().unwrap();
            saw_release
        })
    };

    thread::sleep(Duration::from_millis(150));
    released.store(true, Ordering::SeqCst);
    holder.close().unwrap();

    assert!(
        waiter.join().unwrap(),
        "second exclusive holder acquired before the first released"
    );
}

/// N shared holders hold the lock at the same time.
#[test]
fn test_shared_holders_coexist() {
    let (_temp_dir, manager) = create_store();
    const READERS: usize = 4;
    let barrier = Arc::new(Barrier::new(READERS));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let row = open_table(&manager).get_row("r1", LockMode::Shared).unwrap();
                assert_eq!(row.lock_state(), LockState::Shared);
                // Every reader reaches this point only while all hold the lock
                barrier.wait();
                row.close().unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

/// An exclusive request waits for every shared holder.
#[test]
fn test_exclusive_waits_for_all_shared_holders() {
    let (_temp_dir, manager) = create_store();
    let table = open_table(&manager);
    let acquired = Arc::new(AtomicBool::new(false));

    let mut readers: Vec<_> = (0..3)
        .map(|_| table.get_row("r1", LockMode::Shared).unwrap())
        .collect();

    let writer = {
        let manager = manager.clone();
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            let row = open_table(&manager).get_locked("r1").unwrap();
            acquired.store(true, Ordering::SeqCst);
            row.close().unwrap();
        })
    };

    while let Some(reader) = readers.pop() {
        thread::sleep(Duration::from_millis(100));
        assert!(
            !acquired.load(Ordering::SeqCst),
            "writer acquired while {} shared holders remained",
            readers.len() + 1
        );
        reader.close().unwrap();
    }

    writer.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

// =============================================================================
// Save Preserves Lock State
// =============================================================================

/// Unlocked before save: unlocked after, and the file is free.
#[test]
fn test_save_from_unlocked_leaves_file_free() {
    let (temp_dir, manager) = create_store();
    let mut row = open_table(&manager).get_row("r1", LockMode::None).unwrap();

    row.set("n", 1);
    row.save().unwrap();

    assert_eq!(row.lock_state(), LockState::Unlocked);
    let other = outside_handle(&temp_dir);
    assert!(FileExt::try_lock_exclusive(&other).is_ok());
    FileExt::unlock(&other).unwrap();
}

/// Shared before save: shared after, on the replaced file.
#[test]
fn test_save_from_shared_returns_to_shared() {
    let (temp_dir, manager) = create_store();
    let mut row = open_table(&manager).get_row("r1", LockMode::Shared).unwrap();

    row.set("n", 2);
    row.save().unwrap();

    assert_eq!(row.lock_state(), LockState::Shared);
    let other = outside_handle(&temp_dir);
    assert!(FileExt::try_lock_exclusive(&other).is_err());
    assert!(FileExt::try_lock_shared(&other).is_ok());
    FileExt::unlock(&other).unwrap();
}

/// Exclusive before save: still exclusive, and nobody else gets in.
#[test]
fn test_save_from_exclusive_keeps_new_file_locked() {
    let (temp_dir, manager) = create_store();
    let mut row = open_table(&manager).get_locked("r1").unwrap();

    row.set("n", 3);
    row.save().unwrap();
    row.set("n", 4);
    row.save().unwrap();

    assert_eq!(row.lock_state(), LockState::Exclusive);
    let other = outside_handle(&temp_dir);
    assert!(FileExt::try_lock_shared(&other).is_err());

    row.release_lock().unwrap();
    assert!(FileExt::try_lock_exclusive(&other).is_ok());
    FileExt::unlock(&other).unwrap();
}

// =============================================================================
// Read-Modify-Write
// =============================================================================

/// Increments under exclusive locks from several threads are never lost,
/// even though every save replaces the row file.
#[test]
fn test_concurrent_increments_are_not_lost() {
    let (_temp_dir, manager) = create_store();
    const THREADS: i64 = 4;
    const ROUNDS: i64 = 25;

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                let table = open_table(&manager);
                for _ in 0..ROUNDS {
                    let mut row = table.get_locked("r1").unwrap();
                    let count = row.get("count").and_then(Value::as_i64).unwrap_or(0);
                    row.set("count", count + 1);
                    row.save().unwrap();
                    row.close().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let row = open_table(&manager).get_read_only("r1").unwrap();
    assert_eq!(row.get("count").and_then(Value::as_i64), Some(THREADS * ROUNDS));
}
