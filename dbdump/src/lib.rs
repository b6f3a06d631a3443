//! Command-line front end for dbdump.
//!
//! Turns arguments and an optional JSON config file into the option map
//! [`dbdump_core::Settings`] validates, plus the per-table row filters and
//! limits the dumper takes separately. The binary itself lives in main.rs.
//!
//! Precedence: a config file sets the base map, then every flag given on
//! the command line overrides it. Flags left off never touch the map, so
//! defaults stay with the core crate.

use anyhow::{Context, bail};
use clap::{Args, Parser};
use dbdump_core::{AdapterRegistry, Dsn};
use serde_json::{Map, Value};
use std::{collections::HashMap, path::PathBuf};

/// Command-line interface for dbdump
#[derive(Parser, Debug)]
#[command(name = "dbdump")]
#[command(about = "Logical SQL dump tool for MySQL databases")]
#[command(version)]
#[command(long_about = "
dbdump - replayable SQL dumps of a live database

Reads schema definitions and table rows over a single read-only
connection and writes a SQL script that recreates them.

DSN FORMAT:
  mysql:host=HOST;port=PORT;dbname=DB
  mysql:unix_socket=/path/to/mysqld.sock;dbname=DB

EXAMPLES:
  dbdump -u root -p 'mysql:host=localhost;dbname=shop' -o shop.sql
  dbdump --single-transaction --compress gzip -o shop.sql.gz 'mysql:host=db;dbname=shop'
  dbdump --config dump.json --where-table 'orders=created_at > NOW() - INTERVAL 7 DAY' DSN
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Connection string, e.g. `mysql:host=localhost;dbname=shop`
    #[arg(env = "DBDUMP_DSN")]
    pub dsn: String,

    /// Database user
    #[arg(short, long, env = "DBDUMP_USER", default_value = "root")]
    pub user: String,

    /// Database password (prefer --password-prompt or the environment)
    #[arg(long, env = "DBDUMP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Prompt for the password on the terminal
    #[arg(short = 'p', long, conflicts_with = "password")]
    pub password_prompt: bool,

    /// Output file; `-` writes to stdout
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// JSON file with dump settings, keyed like the long flags
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub dump: DumpArgs,
}

/// Verbosity flags
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Flags mapped onto dump settings
#[derive(Args, Debug, Default)]
pub struct DumpArgs {
    /// Output compression: none, gzip, bzip2, zstd, lz4
    #[arg(long, value_name = "METHOD")]
    pub compress: Option<String>,

    /// Compression level 0-9
    #[arg(long, value_name = "LEVEL")]
    pub compress_level: Option<u32>,

    /// Character set declared in the dump: utf8 or utf8mb4
    #[arg(long, value_name = "CHARSET")]
    pub default_character_set: Option<String>,

    /// Byte budget of one extended INSERT statement
    #[arg(long, value_name = "BYTES")]
    pub net_buffer_length: Option<u64>,

    /// Only dump these tables
    #[arg(long, value_delimiter = ',', value_name = "TABLES")]
    pub include_tables: Vec<String>,

    /// Only dump these views
    #[arg(long, value_delimiter = ',', value_name = "VIEWS")]
    pub include_views: Vec<String>,

    /// Skip these tables and views; `/regex/` entries match by pattern
    #[arg(long, value_delimiter = ',', value_name = "TABLES")]
    pub exclude_tables: Vec<String>,

    /// Skip the rows of every table
    #[arg(long, conflicts_with = "no_data_tables")]
    pub no_data: bool,

    /// Skip the rows of these tables; `/regex/` entries match by pattern
    #[arg(long, value_delimiter = ',', value_name = "TABLES")]
    pub no_data_tables: Vec<String>,

    /// Row filter applied to every table
    #[arg(long = "where", value_name = "CONDITION")]
    pub where_condition: Option<String>,

    /// Row filter for one table, as `table=condition`
    #[arg(long, value_name = "TABLE=CONDITION")]
    pub where_table: Vec<String>,

    /// Row limit for one table, as `table=count` or `table=offset,count`
    #[arg(long, value_name = "TABLE=LIMIT")]
    pub limit_table: Vec<String>,

    #[arg(long, help = "Write DROP DATABASE before CREATE DATABASE")]
    pub add_drop_database: bool,
    #[arg(long, help = "Write DROP TABLE before each CREATE TABLE")]
    pub add_drop_table: bool,
    #[arg(long, help = "Write DROP TRIGGER before each trigger")]
    pub add_drop_trigger: bool,
    #[arg(long, help = "Name the columns in every INSERT")]
    pub complete_insert: bool,
    #[arg(long, help = "Write CREATE DATABASE and USE statements")]
    pub databases: bool,
    #[arg(long, help = "Dump scheduled events")]
    pub events: bool,
    #[arg(long, help = "Write binary columns as hex literals")]
    pub hex_blob: bool,
    #[arg(long, help = "Use CREATE TABLE IF NOT EXISTS")]
    pub if_not_exists: bool,
    #[arg(long, help = "Use INSERT IGNORE")]
    pub insert_ignore: bool,
    #[arg(long, help = "Read-lock each table while its rows are read")]
    pub lock_tables: bool,
    #[arg(long, help = "Wrap each table's inserts in autocommit=0 / COMMIT")]
    pub no_autocommit: bool,
    #[arg(long, help = "Skip CREATE DATABASE")]
    pub no_create_db: bool,
    #[arg(long, help = "Skip table and view definitions")]
    pub no_create_info: bool,
    #[arg(long, help = "Use REPLACE instead of INSERT")]
    pub replace: bool,
    #[arg(long, help = "Remove AUTO_INCREMENT values from table definitions")]
    pub reset_auto_increment: bool,
    #[arg(long, help = "Dump stored procedures and functions")]
    pub routines: bool,
    #[arg(long, help = "Read each table inside a consistent-snapshot transaction")]
    pub single_transaction: bool,
    #[arg(long, help = "Leave out comment blocks")]
    pub skip_comments: bool,
    #[arg(long, help = "Leave out DEFINER clauses")]
    pub skip_definer: bool,
    #[arg(long, help = "Leave the date out of the header and footer")]
    pub skip_dump_date: bool,
    #[arg(long, help = "Do not dump triggers")]
    pub skip_triggers: bool,
    #[arg(long, help = "Do not switch the session time zone to UTC")]
    pub skip_tz_utc: bool,
    #[arg(long, help = "Do not wrap inserts in LOCK TABLES ... WRITE")]
    pub skip_add_locks: bool,
    #[arg(long, help = "Do not wrap inserts in DISABLE/ENABLE KEYS")]
    pub skip_disable_keys: bool,
    #[arg(long, help = "Write one INSERT per row")]
    pub skip_extended_insert: bool,
}

impl DumpArgs {
    fn flags(&self) -> [(&'static str, bool); 21] {
        [
            ("add-drop-database", self.add_drop_database),
            ("add-drop-table", self.add_drop_table),
            ("add-drop-trigger", self.add_drop_trigger),
            ("complete-insert", self.complete_insert),
            ("databases", self.databases),
            ("events", self.events),
            ("hex-blob", self.hex_blob),
            ("if-not-exists", self.if_not_exists),
            ("insert-ignore", self.insert_ignore),
            ("lock-tables", self.lock_tables),
            ("no-autocommit", self.no_autocommit),
            ("no-create-db", self.no_create_db),
            ("no-create-info", self.no_create_info),
            ("replace", self.replace),
            ("reset-auto-increment", self.reset_auto_increment),
            ("routines", self.routines),
            ("single-transaction", self.single_transaction),
            ("skip-comments", self.skip_comments),
            ("skip-definer", self.skip_definer),
            ("skip-dump-date", self.skip_dump_date),
            ("skip-triggers", self.skip_triggers),
        ]
    }
}

/// Reads a JSON settings file; the top level must be an object.
///
/// # Errors
/// Fails when the file cannot be read or is not a JSON object.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    match serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in config file {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("Config file {} must hold a JSON object", path.display()),
    }
}

/// Merges the config file and command-line flags into a settings map.
///
/// # Errors
/// Fails when the config file cannot be loaded.
pub fn build_settings_map(cli: &Cli) -> anyhow::Result<Map<String, Value>> {
    let mut map = match &cli.config {
        Some(path) => load_config(path)?,
        None => Map::new(),
    };
    let args = &cli.dump;

    let mut set = |key: &str, value: Value| {
        map.insert(key.to_string(), value);
    };
    if let Some(method) = &args.compress {
        set("compress", Value::String(method.clone()));
    }
    if let Some(level) = args.compress_level {
        set("compress-level", Value::from(level));
    }
    if let Some(charset) = &args.default_character_set {
        set("default-character-set", Value::String(charset.clone()));
    }
    if let Some(length) = args.net_buffer_length {
        set("net_buffer_length", Value::from(length));
    }
    for (key, list) in [
        ("include-tables", &args.include_tables),
        ("include-views", &args.include_views),
        ("exclude-tables", &args.exclude_tables),
    ] {
        if !list.is_empty() {
            set(key, Value::from(list.clone()));
        }
    }
    if args.no_data {
        set("no-data", Value::Bool(true));
    } else if !args.no_data_tables.is_empty() {
        set("no-data", Value::from(args.no_data_tables.clone()));
    }
    if let Some(condition) = &args.where_condition {
        set("where", Value::String(condition.clone()));
    }
    for (key, enabled) in args.flags() {
        if enabled {
            set(key, Value::Bool(true));
        }
    }
    for (key, skipped) in [
        ("add-locks", args.skip_add_locks),
        ("disable-keys", args.skip_disable_keys),
        ("extended-insert", args.skip_extended_insert),
    ] {
        if skipped {
            set(key, Value::Bool(false));
        }
    }
    Ok(map)
}

/// Parses the DSN argument and checks its dialect against the built-in
/// adapters, before anything connects.
///
/// # Errors
/// Fails on a malformed DSN or one naming an unsupported database.
pub fn parse_dsn(raw: &str) -> anyhow::Result<Dsn> {
    AdapterRegistry::with_defaults()
        .resolve_dsn(raw)
        .context("Invalid DSN")
}

fn split_table_arg<'a>(arg: &'a str, flag: &str) -> anyhow::Result<(&'a str, &'a str)> {
    match arg.split_once('=') {
        Some((table, value)) if !table.trim().is_empty() => Ok((table.trim(), value.trim())),
        _ => bail!("--{} expects TABLE=VALUE, got '{}'", flag, arg),
    }
}

/// Parses `--where-table` arguments.
///
/// # Errors
/// Fails on an argument without a table name.
pub fn parse_table_wheres(args: &[String]) -> anyhow::Result<HashMap<String, String>> {
    args.iter()
        .map(|arg| {
            let (table, condition) = split_table_arg(arg, "where-table")?;
            Ok((table.to_string(), condition.to_string()))
        })
        .collect()
}

/// Parses `--limit-table` arguments into the JSON shapes the dumper takes.
///
/// `t=10` becomes a count and `t=20,10` an `[offset, count]` pair. The
/// values themselves are checked by the dumper, which ignores bad ones.
///
/// # Errors
/// Fails on an argument without a table name.
pub fn parse_table_limits(args: &[String]) -> anyhow::Result<HashMap<String, Value>> {
    args.iter()
        .map(|arg| {
            let (table, limit) = split_table_arg(arg, "limit-table")?;
            let value = match limit.split_once(',') {
                Some((offset, count)) => Value::from(vec![offset.trim(), count.trim()]),
                None => Value::String(limit.to_string()),
            };
            Ok((table.to_string(), value))
        })
        .collect()
}
