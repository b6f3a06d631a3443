//! Core dump pipeline for dbdump.
//!
//! This crate turns a live relational database into a replayable SQL dump:
//! it enumerates schema objects, writes their definitions, and streams each
//! table's rows as size-bounded multi-row INSERT statements into a sink.
//!
//! # Architecture
//! - [`settings`]: validated option map with typed accessors
//! - [`matcher`]: literal and `/regex/` name matching for table filters
//! - [`adapters`]: dialect SQL behind the [`DumpAdapter`] contract and a
//!   registry keyed by the DSN dialect tag
//! - [`source`]: the [`DataSource`] the pipeline queries
//! - [`sink`]: the [`Sink`] the pipeline writes to, with optional compression
//! - [`dump`]: enumeration, column classification, escaping, batching and
//!   the [`Dumper`] orchestrator
//!
//! # Example
//! ```rust,no_run
//! use dbdump_core::{Destination, Settings, dump::dump_database, source::Credentials};
//!
//! # async fn example() -> dbdump_core::Result<()> {
//! let settings = Settings::new(serde_json::Map::new())?;
//! let credentials = Credentials::new("root", Some("secret".to_string()));
//! dump_database(
//!     "mysql:host=localhost;dbname=shop",
//!     &credentials,
//!     settings,
//!     &Destination::Stdout,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod dsn;
pub mod dump;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod settings;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use adapters::{AdapterFeature, AdapterRegistry, DumpAdapter};
pub use dsn::Dsn;
pub use dump::Dumper;
pub use error::{DsnError, DumpError, Result};
pub use logging::init_logging;
pub use matcher::NameMatcher;
pub use models::{ColumnType, Destination, ObjectKind, Row, SchemaObjects, TableColumns, TableLimit};
pub use settings::{CharacterSet, CompressMethod, NoData, Settings};
pub use sink::{FileSink, MemorySink, Sink};
pub use source::DataSource;
