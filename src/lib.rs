//! dirdb - an embedded record store on a plain directory tree
//!
//! Databases and tables are directories; every row is one file holding a
//! JSON mapping of attributes. Readers and writers in any number of threads
//! or processes are coordinated with advisory file locks only.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use dirdb::{LockMode, Manager, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let dir = tempfile::TempDir::new()?;
//! let manager = Manager::new(dir.path())?;
//! let mut db = manager.create_database("app")?;
//! let mut users = db.create_table("users")?;
//!
//! let mut row = users.create_row("alice", LockMode::None)?;
//! row.set("logins", 3);
//! row.set("seen", Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
//! row.save()?;
//! row.close()?;
//!
//! let row = users.get_read_only("alice")?;
//! assert_eq!(row.get("logins"), Some(&Value::from(3)));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codec;
pub mod lock;
pub mod observability;
pub mod store;

pub use codec::{Attributes, CodecError, Opaque, Value};
pub use lock::{Lock, LockMode, LockState};
pub use store::{Database, Manager, Row, StoreError, StoreOptions, StoreResult, Table};
