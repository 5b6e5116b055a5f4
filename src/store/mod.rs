//! Directory-backed store
//!
//! ```text
//! <data_dir>/<db>/.lock
//! <data_dir>/<db>/<table>/.lock
//! <data_dir>/<db>/<table>/<row_key>
//! ```
//!
//! A [`Manager`] hands out [`Database`]s, which hand out [`Table`]s, which
//! hand out [`Row`]s. Each level is a plain directory; each row is one file
//! of tagged JSON. Coordination between handles, threads and processes is
//! done only with advisory file locks.

mod database;
mod errors;
mod manager;
mod names;
mod options;
mod row;
mod table;

pub use database::Database;
pub use errors::{StoreError, StoreResult};
pub use manager::Manager;
pub use names::{random_key, LOCK_FILE};
pub use options::StoreOptions;
pub use row::Row;
pub use table::Table;
