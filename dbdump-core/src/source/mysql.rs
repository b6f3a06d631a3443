//! MySQL data source over a single sqlx connection.
//!
//! Queries go through the text protocol (`raw_sql`), so every column value
//! arrives as the bytes of the server's text rendering and is passed on
//! unchanged. Binary columns stay binary. Hex selections, numeric
//! formatting and date rendering are all done by the server.

/// Quotes a string literal using MySQL escaping rules.
///
/// Works on raw bytes so binary values pass through unchanged apart from
/// the escaped characters.
///
/// # Example
/// ```rust
/// use dbdump_core::source::mysql::quote_string;
///
/// assert_eq!(quote_string(b"it's"), br"'it\'s'");
/// assert_eq!(quote_string(b"a\nb"), br"'a\nb'");
/// ```
pub fn quote_string(value: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(value.len().saturating_add(2));
    quoted.push(b'\'');
    for &byte in value {
        match byte {
            b'\0' => quoted.extend_from_slice(b"\\0"),
            b'\n' => quoted.extend_from_slice(b"\\n"),
            b'\r' => quoted.extend_from_slice(b"\\r"),
            b'\\' => quoted.extend_from_slice(b"\\\\"),
            b'\'' => quoted.extend_from_slice(b"\\'"),
            b'"' => quoted.extend_from_slice(b"\\\""),
            0x1a => quoted.extend_from_slice(b"\\Z"),
            other => quoted.push(other),
        }
    }
    quoted.push(b'\'');
    quoted
}

#[cfg(feature = "mysql")]
pub use connection::MySqlSource;

#[cfg(feature = "mysql")]
mod connection {
    use super::quote_string;
    use crate::{
        Result,
        dsn::Dsn,
        error::DumpError,
        models::Row,
        source::{Credentials, DataSource, QuoteFn},
    };
    use async_trait::async_trait;
    use futures::{StreamExt, TryStreamExt, stream::BoxStream};
    use sqlx::{
        Column, ConnectOptions, Row as _,
        mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow},
    };

    /// MySQL connection owned by one dump run.
    pub struct MySqlSource {
        connection: MySqlConnection,
        endpoint: String,
    }

    impl std::fmt::Debug for MySqlSource {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MySqlSource")
                .field("endpoint", &self.endpoint)
                .finish_non_exhaustive()
        }
    }

    impl MySqlSource {
        /// Opens a connection described by a parsed DSN.
        ///
        /// A unix socket takes precedence over a host. A `charset` DSN
        /// parameter is passed on to the driver.
        ///
        /// # Errors
        /// Returns [`DumpError::Connection`] naming the host or socket when
        /// the server is unreachable or rejects the credentials.
        pub async fn connect(dsn: &Dsn, credentials: &Credentials) -> Result<Self> {
            let mut options = MySqlConnectOptions::new()
                .username(&credentials.user)
                .database(&dsn.database)
                .disable_statement_logging();
            if let Some(password) = &credentials.password {
                options = options.password(password);
            }
            if let Some(socket) = &dsn.unix_socket {
                options = options.socket(socket);
            } else if let Some(host) = &dsn.host {
                options = options.host(host);
            }
            if let Some(port) = dsn.port {
                options = options.port(port);
            }
            if let Some(charset) = dsn.params.get("charset") {
                options = options.charset(charset);
            }

            let endpoint = dsn.endpoint().to_string();
            tracing::debug!("Connecting to MySQL at {}", endpoint);
            let connection = options
                .connect()
                .await
                .map_err(|e| DumpError::connection_failed(&endpoint, e))?;
            tracing::info!("Connected to {} database '{}'", endpoint, dsn.database);

            Ok(Self {
                connection,
                endpoint,
            })
        }
    }

    fn convert_row(row: &MySqlRow) -> Result<Row> {
        let mut converted = Row::new();
        for (index, column) in row.columns().iter().enumerate() {
            let raw: Option<Vec<u8>> = row.try_get_unchecked(index).map_err(|e| {
                DumpError::query_failed(format!("Failed to read column '{}'", column.name()), e)
            })?;
            converted.push(column.name(), raw);
        }
        Ok(converted)
    }

    #[async_trait]
    impl DataSource for MySqlSource {
        async fn execute(&mut self, sql: &str) -> Result<()> {
            tracing::trace!("Executing: {}", sql);
            let connection: &mut MySqlConnection = &mut self.connection;
            sqlx::raw_sql(sql)
                .fetch_many(connection)
                .try_collect::<Vec<_>>()
                .await
                .map_err(|e| DumpError::query_failed(format!("Statement failed: {}", sql), e))?;
            Ok(())
        }

        fn fetch<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>> {
            tracing::trace!("Fetching: {}", sql);
            sqlx::raw_sql(sql)
                .fetch(&mut self.connection)
                .map(move |row| {
                    row.map_err(|e| DumpError::query_failed(format!("Query failed: {}", sql), e))
                        .and_then(|row| convert_row(&row))
                })
                .boxed()
        }

        fn quoter(&self) -> QuoteFn {
            quote_string
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(value: &[u8]) -> String {
        String::from_utf8(quote_string(value)).unwrap()
    }

    #[test]
    fn test_quote_plain_text() {
        assert_eq!(quoted(b"alice"), "'alice'");
        assert_eq!(quoted(b""), "''");
    }

    #[test]
    fn test_quote_escapes_special_characters() {
        assert_eq!(quoted(b"O'Reilly"), r"'O\'Reilly'");
        assert_eq!(quoted(b"say \"hi\""), r#"'say \"hi\"'"#);
        assert_eq!(quoted(b"back\\slash"), r"'back\\slash'");
        assert_eq!(quoted(b"line\r\nbreak"), r"'line\r\nbreak'");
        assert_eq!(quoted(b"nul\0byte"), r"'nul\0byte'");
        assert_eq!(quoted(b"ctrl\x1az"), r"'ctrl\Zz'");
    }

    #[test]
    fn test_quote_keeps_unicode() {
        assert_eq!(quoted("naïve ☕".as_bytes()), "'naïve ☕'");
    }

    #[test]
    fn test_quote_keeps_binary_bytes() {
        assert_eq!(quote_string(&[0xff, 0x00, 0x80]), vec![b'\'', 0xff, b'\\', b'0', 0x80, b'\'']);
    }
}
