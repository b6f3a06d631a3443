//! Error types for the dump pipeline.
//!
//! Every failure is fatal for the run: nothing here is retried or skipped,
//! and a failure after the sink was opened leaves a partial dump behind.
//! Passwords never reach these messages; connection errors carry the host
//! only.

use thiserror::Error;

/// Reasons a connection string is rejected before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DsnError {
    /// The DSN was empty or whitespace only
    #[error("Empty DSN string")]
    Empty,

    /// No `<dialect>:` prefix was present
    #[error("Missing database type from DSN string")]
    MissingDialect,

    /// The dialect prefix has no registered adapter
    #[error("Unknown database type '{0}' in DSN string")]
    UnknownDialect(String),

    /// Neither `host` nor `unix_socket` was given
    #[error("Missing host from DSN string")]
    MissingHost,

    /// `dbname` was absent or empty
    #[error("Missing database name from DSN string")]
    MissingDatabase,

    /// `port` was present but not a valid TCP port
    #[error("Invalid port '{0}' in DSN string")]
    InvalidPort(String),
}

/// Main error type for dump operations.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Invalid or conflicting settings
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed connection string
    #[error("Invalid connection string: {0}")]
    ConnectionString(#[from] DsnError),

    /// The data source could not be reached or refused the credentials
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Requested include-tables were not found in the database
    #[error("Table ({}) not found in database", .missing.join(","))]
    SchemaResolution { missing: Vec<String> },

    /// Unsupported dialect or a non-conforming adapter registration
    #[error("Adapter capability error: {message}")]
    AdapterCapability { message: String },

    /// A statement or query failed on the data source
    #[error("Query execution failed: {context}")]
    QueryExecution {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A query returned rows in a shape the adapter cannot use
    #[error("Unexpected result: {context}")]
    UnexpectedResult { context: String },

    /// Writing to the sink failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with DumpError
pub type Result<T> = std::result::Result<T, DumpError>;

impl DumpError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a connection error scoped to a host, without credentials
    pub fn connection_failed<E>(host: &str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: format!("could not connect to {}", host),
            source: Box::new(error),
        }
    }

    /// Creates a query execution error with context
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::QueryExecution {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an adapter capability error
    pub fn adapter_capability(message: impl Into<String>) -> Self {
        Self::AdapterCapability {
            message: message.into(),
        }
    }

    /// Creates an unexpected result error
    pub fn unexpected_result(context: impl Into<String>) -> Self {
        Self::UnexpectedResult {
            context: context.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
