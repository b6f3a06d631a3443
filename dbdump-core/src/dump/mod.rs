//! The dump pipeline.
//!
//! # Module Structure
//! - `enumerate`: schema object discovery with include filtering
//! - `columns`: column classification and column-list SQL
//! - `escape`: value literal rendering
//! - `batcher`: extended-INSERT packing under `net_buffer_length`
//! - `comments`: header, footer and section comment blocks
//! - `dumper`: the [`Dumper`] orchestrator

pub mod batcher;
pub mod columns;
pub mod comments;
pub mod enumerate;
pub mod escape;

mod dumper;

pub use dumper::{ColumnTransform, Dumper, InfoHook, RowTransform};

#[cfg(feature = "mysql")]
use crate::{
    Result,
    adapters::AdapterRegistry,
    models::Destination,
    settings::Settings,
    sink::FileSink,
    source::{Credentials, mysql::MySqlSource},
};

/// Dumps one database to a destination in a single call.
///
/// Connects with the built-in MySQL source and writes through a
/// [`FileSink`] using the `compress` and `compress-level` settings.
///
/// # Errors
/// Returns [`crate::DumpError::ConnectionString`] before any connection is
/// attempted when the DSN is malformed or names an unknown dialect, and
/// any connection, query or I/O error of the run itself.
#[cfg(feature = "mysql")]
pub async fn dump_database(
    dsn: &str,
    credentials: &Credentials,
    settings: Settings,
    destination: &Destination,
) -> Result<()> {
    let parsed = AdapterRegistry::with_defaults().resolve_dsn(dsn)?;

    let source = MySqlSource::connect(&parsed, credentials).await?;
    let sink = FileSink::new(settings.compress(), settings.compress_level());
    let mut dumper = Dumper::new(dsn, settings, Box::new(source), Box::new(sink))?;
    dumper.start(destination).await
}
