//! Dialect adapter contract and registry.
//!
//! A [`DumpAdapter`] produces every piece of dialect-specific SQL text the
//! dump pipeline needs: listing and SHOW statements it runs against the
//! data source, and the DDL and session wrappers it writes into the dump.
//! Adapters never perform I/O themselves, which keeps the trait object-safe
//! and synchronous.
//!
//! # Module Structure
//! - `mysql`: reference adapter for MySQL and MariaDB
//!
//! Adapters are looked up through an [`AdapterRegistry`] keyed by the
//! dialect tag of the connection string (`mysql` in `mysql:host=...`).
//! Registration instantiates the adapter once and rejects it immediately if
//! it does not conform, instead of failing at first use.

use crate::{
    Result,
    dsn::Dsn,
    error::{DsnError, DumpError},
    models::{ColumnType, ObjectKind, Row, TableColumns},
    settings::Settings,
};
use std::collections::HashMap;

pub mod mysql;

/// Capabilities an adapter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterFeature {
    /// Table, view and column introspection plus CREATE statements
    SchemaIntrospection,
    /// Transactional consistent reads (`single-transaction`)
    ConsistentSnapshot,
    /// Read locks on individual tables (`lock-tables`)
    TableLocking,
    /// Triggers, procedures and functions
    Routines,
    /// Scheduled events
    Events,
    /// Hex selection of binary columns (`hex-blob`)
    HexBlob,
}

impl AdapterFeature {
    /// Features every registered adapter must support.
    pub const REQUIRED: &'static [AdapterFeature] = &[AdapterFeature::SchemaIntrospection];
}

/// Dialect-specific SQL text for the dump pipeline.
///
/// Methods named after a DDL object take the row returned by the matching
/// `show_create` query and return the text written to the dump.
///
/// # Object Safety
/// This trait is object-safe; the pipeline holds a `Box<dyn DumpAdapter>`.
pub trait DumpAdapter: Send + Sync {
    /// Dialect tag this adapter is registered under.
    fn dialect(&self) -> &'static str;

    /// Checks if the adapter supports a specific feature.
    fn supports_feature(&self, feature: AdapterFeature) -> bool;

    /// Quotes a table, column or database identifier.
    fn quote_identifier(&self, name: &str) -> String;

    // ----- introspection queries -----

    /// Query listing objects of one kind in `database`.
    fn list_objects(&self, kind: ObjectKind, database: &str) -> String;

    /// Extracts the object name from one row of [`Self::list_objects`].
    fn listed_name<'r>(&self, kind: ObjectKind, row: &'r Row) -> Option<&'r str> {
        let _ = kind;
        row.first()
    }

    /// Query describing the columns of a table or view.
    fn show_columns(&self, table: &str) -> String;

    /// Query returning the definition of one object.
    fn show_create(&self, kind: ObjectKind, name: &str) -> String;

    /// Query returning the server version string.
    fn server_version_query(&self) -> &'static str;

    // ----- DDL builders -----

    /// CREATE TABLE text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] when the row lacks the
    /// definition column.
    fn create_table(&self, row: &Row) -> Result<String>;

    /// CREATE VIEW text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] on a malformed row.
    fn create_view(&self, row: &Row) -> Result<String>;

    /// CREATE TRIGGER text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] on a malformed row.
    fn create_trigger(&self, row: &Row) -> Result<String>;

    /// CREATE PROCEDURE text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] on a malformed row.
    fn create_procedure(&self, row: &Row) -> Result<String>;

    /// CREATE FUNCTION text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] on a malformed row.
    fn create_function(&self, row: &Row) -> Result<String>;

    /// CREATE EVENT text from a `show_create` row.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] on a malformed row.
    fn create_event(&self, row: &Row) -> Result<String>;

    /// Placeholder table standing in for a view until the real view is
    /// created, declaring every column with its raw type.
    fn create_stand_in_table(&self, view: &str, columns: &TableColumns) -> String;

    /// DROP TABLE text.
    fn drop_table(&self, table: &str) -> String;

    /// DROP for the stand-in table of a view.
    fn drop_stand_in_table(&self, view: &str) -> String;

    /// DROP VIEW text.
    fn drop_view(&self, view: &str) -> String;

    /// DROP TRIGGER text.
    fn drop_trigger(&self, trigger: &str) -> String;

    /// DROP PROCEDURE text.
    fn drop_procedure(&self, procedure: &str) -> String;

    /// DROP FUNCTION text.
    fn drop_function(&self, function: &str) -> String;

    /// DROP EVENT text.
    fn drop_event(&self, event: &str) -> String;

    // ----- database level -----

    /// Comment block introducing the database section.
    fn database_header(&self, database: &str) -> String;

    /// DROP DATABASE text.
    fn drop_database(&self, database: &str) -> String;

    /// Query returning the database default character set and collation.
    fn show_database_defaults(&self) -> String;

    /// CREATE DATABASE text from a [`Self::show_database_defaults`] row.
    fn create_database(&self, database: &str, defaults: &Row) -> String;

    /// Session-parameter preamble written at the top of the dump.
    fn backup_parameters(&self) -> String;

    /// Postamble restoring the session parameters saved by
    /// [`Self::backup_parameters`].
    fn restore_parameters(&self) -> String;

    // ----- statements executed on the data source -----

    /// Statement preparing a consistent-snapshot transaction.
    fn setup_transaction(&self) -> String;

    /// Statement starting the consistent-snapshot transaction.
    fn start_transaction(&self) -> String;

    /// Statement committing the transaction.
    fn commit_transaction(&self) -> String;

    /// Statement acquiring a read lock on one table.
    fn lock_table(&self, table: &str) -> String;

    /// Statement releasing table locks.
    fn unlock_table(&self, table: &str) -> String;

    // ----- text wrappers written around table rows -----

    /// Written before rows when `add-locks` is on.
    fn start_add_lock_table(&self, table: &str) -> String;

    /// Written after rows when `add-locks` is on.
    fn end_add_lock_table(&self, table: &str) -> String;

    /// Written before rows when `disable-keys` is on.
    fn start_disable_keys(&self, table: &str) -> String;

    /// Written after rows when `disable-keys` is on.
    fn end_disable_keys(&self, table: &str) -> String;

    /// Written before rows when `no-autocommit` is on.
    fn start_disable_autocommit(&self) -> String;

    /// Written after rows when `no-autocommit` is on.
    fn end_disable_autocommit(&self) -> String;

    // ----- column handling -----

    /// Classifies one row of [`Self::show_columns`].
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] when the row lacks the name
    /// or type column.
    fn parse_column_type(&self, row: &Row) -> Result<ColumnType>;

    /// Selection of a binary column as a hex string.
    fn select_hex(&self, column: &str) -> String;

    /// Selection of a bit column as a zero-padded hex string.
    fn select_hex_bit(&self, column: &str) -> String;
}

/// Constructor stored in the registry.
pub type AdapterFactory = fn(&Settings) -> Box<dyn DumpAdapter>;

/// Registry mapping dialect tags to adapter factories.
///
/// # Example
/// ```rust
/// use dbdump_core::{AdapterRegistry, Settings};
///
/// let registry = AdapterRegistry::with_defaults();
/// let adapter = registry.create("mysql", &Settings::default()).unwrap();
/// assert_eq!(adapter.quote_identifier("users"), "`users`");
/// assert!(registry.create("oracle", &Settings::default()).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in adapters.
    pub fn with_defaults() -> Self {
        let mut factories: HashMap<String, AdapterFactory> = HashMap::new();
        factories.insert(mysql::DIALECT.to_string(), mysql::factory);
        Self { factories }
    }

    /// Registers an adapter factory under a dialect tag.
    ///
    /// The factory is invoked once with default settings to check that the
    /// adapter reports the same tag and supports every required feature.
    ///
    /// # Errors
    /// Returns [`DumpError::AdapterCapability`] for a non-conforming adapter.
    pub fn register(&mut self, dialect: &str, factory: AdapterFactory) -> Result<()> {
        let dialect = dialect.to_lowercase();
        let probe = factory(&Settings::default());

        if probe.dialect() != dialect {
            return Err(DumpError::adapter_capability(format!(
                "adapter registered as '{}' reports dialect '{}'",
                dialect,
                probe.dialect()
            )));
        }
        let missing: Vec<String> = AdapterFeature::REQUIRED
            .iter()
            .filter(|feature| !probe.supports_feature(**feature))
            .map(|feature| format!("{:?}", feature))
            .collect();
        if !missing.is_empty() {
            return Err(DumpError::adapter_capability(format!(
                "adapter '{}' lacks required features: {}",
                dialect,
                missing.join(", ")
            )));
        }

        tracing::debug!("Registered dump adapter '{}'", dialect);
        self.factories.insert(dialect, factory);
        Ok(())
    }

    /// Whether an adapter is registered for `dialect`.
    pub fn contains(&self, dialect: &str) -> bool {
        self.factories.contains_key(&dialect.to_lowercase())
    }

    /// Parses a DSN and checks that its dialect has an adapter.
    ///
    /// Run this before opening any connection, so a DSN naming an
    /// unsupported database fails without network I/O.
    ///
    /// # Errors
    /// Returns [`DumpError::ConnectionString`] for a malformed DSN or one
    /// naming an unregistered dialect.
    pub fn resolve_dsn(&self, dsn: &str) -> Result<Dsn> {
        let parsed = Dsn::parse(dsn)?;
        if !self.contains(&parsed.dialect) {
            return Err(DsnError::UnknownDialect(parsed.dialect).into());
        }
        Ok(parsed)
    }

    /// Instantiates the adapter for `dialect`.
    ///
    /// # Errors
    /// Returns [`DsnError::UnknownDialect`] when nothing is registered.
    pub fn create(&self, dialect: &str, settings: &Settings) -> Result<Box<dyn DumpAdapter>> {
        let factory = self
            .factories
            .get(&dialect.to_lowercase())
            .ok_or_else(|| DsnError::UnknownDialect(dialect.to_string()))?;
        Ok(factory(settings))
    }
}
