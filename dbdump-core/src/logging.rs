//! Diagnostics for dump runs.
//!
//! Everything goes to stderr, since `-o -` streams the dump itself on
//! stdout and a stray log line there would corrupt it. The level comes from
//! the `-v`/`-q` flags; `DBDUMP_LOG` takes a full filter directive instead
//! (for example `DBDUMP_LOG=dbdump_core=trace,sqlx=debug`).

use crate::{Result, error::DumpError};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the flag-derived filter.
pub const LOG_ENV: &str = "DBDUMP_LOG";

/// Maps CLI verbosity flags to a tracing level.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Filter directives for the given flags.
///
/// The driver stays at `warn` unless tracing is on, so `-v` shows the
/// pipeline's own steps (tables, locks, batches) without connection noise.
pub fn filter_directives(verbose: u8, quiet: bool) -> String {
    let level = level_for(verbose, quiet);
    let driver = if level == tracing::Level::TRACE { "debug" } else { "warn" };
    format!("{},sqlx={}", level.as_str().to_lowercase(), driver)
}

/// Installs the stderr subscriber for a dump run.
///
/// # Errors
/// Returns [`DumpError::Configuration`] when `DBDUMP_LOG` holds an invalid
/// directive or a subscriber is already installed.
///
/// # Example
/// ```rust,no_run
/// use dbdump_core::logging::init_logging;
///
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives).map_err(|e| {
            DumpError::configuration(format!("Invalid {} value '{}': {}", LOG_ENV, directives, e))
        })?,
        Err(_) => EnvFilter::new(filter_directives(verbose, quiet)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| DumpError::configuration(format!("Failed to initialize logging: {}", e)))
}
