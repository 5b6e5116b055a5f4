//! Advisory locking for dirdb
//!
//! Every database, table and row handle owns exactly one [`Lock`]. The lock
//! wraps one open file and issues blocking `flock(2)` calls (via `fs2`) on
//! it, tracking what the handle believes it holds.
//!
//! # Rules
//!
//! - Shared locks coexist; an exclusive lock excludes every other holder
//! - Acquisition blocks indefinitely, with no timeout
//! - Shared to exclusive is a single upgrade call
//! - Scoped guards restore the previous state on every exit path
//! - Locks are cooperative: processes that never ask are not stopped

mod errors;
mod file_lock;
mod state;

pub use errors::{LockError, LockResult};
pub use file_lock::{Lock, LockGuard};
pub use state::{LockMode, LockState, ParseLockModeError};

pub(crate) use file_lock::lock_exclusive;
