//! CLI argument definitions using clap
//!
//! Commands:
//! - dirdb create-db <db>
//! - dirdb drop-db <db>
//! - dirdb create-table <db> <table>
//! - dirdb drop-table <db> <table>
//! - dirdb list [db] [table]
//! - dirdb get <db> <table> <key>
//! - dirdb put <db> <table> <key>        (attributes on stdin)
//! - dirdb create-row <db> <table> (--key <key> | --unique <len>)
//! - dirdb remove-row <db> <table> <key>
//! - dirdb stats

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// dirdb - records as files, coordinated by advisory locks
#[derive(Parser, Debug)]
#[command(name = "dirdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./dirdb.json")]
    pub config: PathBuf,

    /// Data directory, overrides the configuration file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a database
    CreateDb { db: String },

    /// Remove a database with all of its tables
    DropDb { db: String },

    /// Create a table
    CreateTable { db: String, table: String },

    /// Remove a table with all of its rows
    DropTable { db: String, table: String },

    /// List databases, the tables of a database, or the keys of a table
    List {
        db: Option<String>,
        table: Option<String>,
    },

    /// Print a row as tagged JSON
    Get(RowArgs),

    /// Merge a tagged-JSON mapping read from stdin into a row and save it
    Put(RowArgs),

    /// Create an empty row
    CreateRow(CreateRowArgs),

    /// Remove a row
    RemoveRow(RowArgs),

    /// Print inventory counts for the data directory
    Stats,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RowArgs {
    pub db: String,
    pub table: String,
    pub key: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CreateRowArgs {
    pub db: String,
    pub table: String,

    /// Key of the new row
    #[arg(long, required_unless_present = "unique", conflicts_with = "unique")]
    pub key: Option<String>,

    /// Generate a random key of this many characters
    #[arg(long, value_name = "LEN")]
    pub unique: Option<usize>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
