//! Observability subsystem for dirdb
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Monotonic counters
//!
//! Observability is read-only: nothing here affects what a store operation
//! does or returns.
//!
//! # Usage
//!
//! ```ignore
//! use dirdb::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_level(Severity::Info);
//! log_event_with_fields(Event::RowSaved, &[("key", "r1")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
