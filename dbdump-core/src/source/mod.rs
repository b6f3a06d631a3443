//! The data source the dump pipeline reads from.
//!
//! A [`DataSource`] owns one connection for the whole run. The pipeline
//! issues session and lock statements through [`DataSource::execute`],
//! small metadata queries through [`DataSource::query`], and streams table
//! rows through [`DataSource::fetch`]. Every value arrives as the bytes of
//! its text rendering, with `None` standing for SQL NULL.
//!
//! # Module Structure
//! - `mysql`: sqlx-backed MySQL source and the MySQL string quoting rules

use crate::{Result, error::DumpError, models::Row};
use async_trait::async_trait;
use futures::{TryStreamExt, stream::BoxStream};

pub mod mysql;

/// Driver-level string literal quoting over raw value bytes.
///
/// A plain function pointer so the pipeline can keep it while the source is
/// mutably borrowed by a row stream.
pub type QuoteFn = fn(&[u8]) -> Vec<u8>;

/// Connection used by the dump pipeline.
///
/// # Object Safety
/// This trait is object-safe; the pipeline holds a `Box<dyn DataSource>`.
#[async_trait]
pub trait DataSource: Send {
    /// Runs a statement that returns no rows.
    ///
    /// # Errors
    /// Returns [`DumpError::QueryExecution`] if the statement fails.
    async fn execute(&mut self, sql: &str) -> Result<()>;

    /// Streams the rows of a query in cursor order.
    fn fetch<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>>;

    /// Runs a query and collects every row.
    ///
    /// # Errors
    /// Returns [`DumpError::QueryExecution`] if the query fails.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.fetch(sql).try_collect().await
    }

    /// Quoting function producing a safely escaped string literal.
    fn quoter(&self) -> QuoteFn;

    /// Reads the server version with the adapter-supplied query.
    ///
    /// # Errors
    /// Returns [`DumpError::UnexpectedResult`] when the query yields no value.
    async fn server_version(&mut self, sql: &str) -> Result<String> {
        let rows = self.query(sql).await?;
        rows.first()
            .and_then(Row::first)
            .map(str::to_string)
            .ok_or_else(|| DumpError::unexpected_result("server version query returned no rows"))
    }
}

/// Login credentials, kept apart from the DSN so the DSN can be logged.
#[derive(Clone, Default)]
pub struct Credentials {
    /// User name
    pub user: String,
    /// Password, if any
    pub password: Option<String>,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("root", Some("hunter2".to_string()));
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("root"));
        assert!(rendered.contains("****"));
        assert!(!rendered.contains("hunter2"));
    }
}
