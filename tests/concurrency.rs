//! Concurrent Creation Tests
//!
//! Row creation is serialized by the table lock. Each thread uses its own
//! handles, so threads contend exactly like separate processes would.

use dirdb::{LockMode, Manager, StoreError, StoreOptions};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn create_store() -> (TempDir, Manager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let options = StoreOptions {
        sync_writes: false,
        ..StoreOptions::default()
    };
    let manager = Manager::with_options(temp_dir.path(), options).unwrap();
    manager
        .create_database("db1")
        .unwrap()
        .create_table("t1")
        .unwrap();
    (temp_dir, manager)
}

/// K creators racing on one key: exactly one wins, K-1 see RowAlreadyExists.
#[test]
fn test_racing_creators_have_one_winner() {
    let (_temp_dir, manager) = create_store();
    const CREATORS: usize = 8;
    let barrier = Arc::new(Barrier::new(CREATORS));

    let handles: Vec<_> = (0..CREATORS)
        .map(|i| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut table = manager.database("db1").unwrap().table("t1").unwrap();
                barrier.wait();
                match table.create_row("contested", LockMode::None) {
                    Ok(mut row) => {
                        row.set("winner", i as u64);
                        row.save().unwrap();
                        Ok(i)
                    }
                    Err(e) => Err(e),
                }
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners: Vec<usize> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(winners.len(), 1, "expected exactly one creator to succeed");

    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::RowAlreadyExists(k)) if k == "contested"))
        .count();
    assert_eq!(losers, CREATORS - 1);

    let row = manager
        .database("db1")
        .unwrap()
        .table("t1")
        .unwrap()
        .get_read_only("contested")
        .unwrap();
    assert_eq!(
        row.get("winner").and_then(|v| v.as_u64()),
        Some(winners[0] as u64)
    );
}

/// Unique-key creation from many threads yields distinct rows.
#[test]
fn test_parallel_unique_keys_are_distinct() {
    let (_temp_dir, manager) = create_store();
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                let mut table = manager.database("db1").unwrap().table("t1").unwrap();
                (0..PER_THREAD)
                    .map(|_| {
                        table
                            .create_row_with_unique_key(6, LockMode::None)
                            .unwrap()
                            .key()
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut keys = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(keys.insert(key));
        }
    }

    let table = manager.database("db1").unwrap().table("t1").unwrap();
    assert_eq!(table.keys().unwrap().len(), THREADS * PER_THREAD);
    assert_eq!(manager.metrics().snapshot().rows_created, (THREADS * PER_THREAD) as u64);
}
