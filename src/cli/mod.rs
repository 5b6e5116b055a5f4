//! CLI module for dirdb
//!
//! A thin driver over [`crate::store`]: every command opens the data
//! directory, performs one store operation and prints one JSON response.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, CreateRowArgs, RowArgs};
pub use commands::{create_row, execute, get, list, put, run, run_command, stats, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
