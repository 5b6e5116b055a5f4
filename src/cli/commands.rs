//! CLI command implementations
//!
//! Each command opens the store, does one thing, and reports it as a single
//! JSON value. Rows are only held for the duration of the command.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::codec;
use crate::lock::LockMode;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::store::{Manager, StoreOptions};

use super::args::{Cli, Command, CreateRowArgs, RowArgs};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required unless given with --data-dir)
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Random keys tried by `create-row --unique` (optional, default 100)
    #[serde(default = "default_unique_key_attempts")]
    pub unique_key_attempts: u32,

    /// fsync on every write (optional, default true)
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,

    /// Minimum severity written to stderr (optional, default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_unique_key_attempts() -> u32 {
    100
}
fn default_sync_writes() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            unique_key_attempts: default_unique_key_attempts(),
            sync_writes: default_sync_writes(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file, or use defaults if there is none
    pub fn load_or_default(path: &Path) -> CliResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.unique_key_attempts == 0 {
            return Err(CliError::config_error("unique_key_attempts must be > 0"));
        }
        if matches!(&self.data_dir, Some(dir) if dir.is_empty()) {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        self.log_severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(CliError::config_error)
    }

    /// Options handed to the store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            unique_key_attempts: self.unique_key_attempts,
            sync_writes: self.sync_writes,
        }
    }

    /// Data directory, preferring an explicit override
    pub fn resolve_data_dir(&self, data_dir: Option<PathBuf>) -> CliResult<PathBuf> {
        data_dir
            .or_else(|| self.data_dir.as_ref().map(PathBuf::from))
            .ok_or_else(|| CliError::config_error("data_dir is required (config or --data-dir)"))
    }
}

/// Main CLI entry point
///
/// Parses arguments, runs the command and writes its response. Failures are
/// written as an error response and returned.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match execute(cli) {
        Ok(data) => write_response(data),
        Err(e) => {
            Logger::log(
                e.severity(),
                Event::CommandFailed.as_str(),
                &[("code", e.code_str()), ("message", e.message())],
            );
            write_error(e.code_str(), e.message())?;
            Err(e)
        }
    }
}

/// Load configuration, open the store and run the command
pub fn execute(cli: Cli) -> CliResult<Value> {
    let config = Config::load_or_default(&cli.config)?;
    Logger::set_level(config.log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("path", &cli.config.to_string_lossy())],
    );

    let data_dir = config.resolve_data_dir(cli.data_dir)?;
    let manager = Manager::with_options(data_dir, config.store_options())?;
    run_command(&manager, cli.command)
}

/// Run one command against an open store
pub fn run_command(manager: &Manager, cmd: Command) -> CliResult<Value> {
    match cmd {
        Command::CreateDb { db } => {
            manager.create_database(&db)?;
            Ok(json!({ "created": db }))
        }
        Command::DropDb { db } => {
            manager.remove_database(&db)?;
            Ok(json!({ "removed": db }))
        }
        Command::CreateTable { db, table } => {
            manager.database(&db)?.create_table(&table)?;
            Ok(json!({ "created": table }))
        }
        Command::DropTable { db, table } => {
            manager.database(&db)?.remove_table(&table)?;
            Ok(json!({ "removed": table }))
        }
        Command::List { db, table } => list(manager, db.as_deref(), table.as_deref()),
        Command::Get(args) => get(manager, &args),
        Command::Put(args) => {
            let request = read_request()?;
            put(manager, &args, request)
        }
        Command::CreateRow(args) => create_row(manager, &args),
        Command::RemoveRow(args) => {
            manager
                .database(&args.db)?
                .table(&args.table)?
                .remove(&args.key)?;
            Ok(json!({ "removed": args.key }))
        }
        Command::Stats => stats(manager),
    }
}

/// Databases, tables of a database, or keys of a table
pub fn list(manager: &Manager, db: Option<&str>, table: Option<&str>) -> CliResult<Value> {
    match (db, table) {
        (None, _) => Ok(json!({ "databases": manager.databases()? })),
        (Some(db), None) => Ok(json!({ "tables": manager.database(db)?.tables()? })),
        (Some(db), Some(table)) => {
            let keys = manager.database(db)?.table(table)?.keys()?;
            Ok(json!({ "keys": keys }))
        }
    }
}

/// A row's attributes as tagged JSON
pub fn get(manager: &Manager, args: &RowArgs) -> CliResult<Value> {
    let row = manager
        .database(&args.db)?
        .table(&args.table)?
        .get_read_only(&args.key)?;
    let attributes = codec::to_json(row.attributes())?;
    row.close()?;
    Ok(json!({ "key": args.key, "attributes": attributes }))
}

/// Merge `request` into a row under an exclusive lock and save it
pub fn put(manager: &Manager, args: &RowArgs, request: Value) -> CliResult<Value> {
    let update = codec::from_json(request)?;

    let mut row = manager
        .database(&args.db)?
        .table(&args.table)?
        .get_locked(&args.key)?;
    row.attributes_mut().extend(update);
    row.save()?;

    let attributes = codec::to_json(row.attributes())?;
    row.close()?;
    Ok(json!({ "key": args.key, "attributes": attributes }))
}

/// Create an empty row under an explicit or generated key
pub fn create_row(manager: &Manager, args: &CreateRowArgs) -> CliResult<Value> {
    let mut table = manager.database(&args.db)?.table(&args.table)?;
    let row = match (&args.key, args.unique) {
        (Some(key), None) => table.create_row(key, LockMode::None)?,
        (None, Some(length)) => table.create_row_with_unique_key(length, LockMode::None)?,
        _ => {
            return Err(CliError::invalid_input(
                "exactly one of --key and --unique is required",
            ))
        }
    };
    let key = row.key().to_string();
    row.close()?;
    Ok(json!({ "created": key }))
}

/// Row counts per table, per database, and in total
pub fn stats(manager: &Manager) -> CliResult<Value> {
    let mut databases = Map::new();
    let mut table_count = 0usize;
    let mut row_count = 0usize;

    for db_name in manager.databases()? {
        let db = manager.database(&db_name)?;
        let mut tables = Map::new();
        for table_name in db.tables()? {
            let rows = db.table(&table_name)?.keys()?.len();
            table_count += 1;
            row_count += rows;
            tables.insert(table_name, json!(rows));
        }
        databases.insert(db_name, Value::Object(tables));
    }

    let database_count = databases.len();
    Ok(json!({
        "databases": databases,
        "totals": {
            "databases": database_count,
            "tables": table_count,
            "rows": row_count,
        }
    }))
}
