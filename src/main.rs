//! dirdb CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. The JSON response
//! (success or error) is already on stdout when this returns; failures are
//! repeated on stderr and exit non-zero.

use dirdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
