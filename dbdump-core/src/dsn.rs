//! Connection string parsing.
//!
//! A DSN has the form `<dialect>:<key=value>[;key=value...]`, for example
//! `mysql:host=localhost;port=3306;dbname=shop`. Keys are case-insensitive.
//! Either `host` or `unix_socket` must be present, and `dbname` is required.
//! Parsing never touches the network.

use crate::error::DsnError;
use std::collections::BTreeMap;

/// Parsed connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dsn {
    /// Dialect tag used to pick the adapter, e.g. `mysql`
    pub dialect: String,
    /// Host name, if connecting over TCP
    pub host: Option<String>,
    /// TCP port
    pub port: Option<u16>,
    /// Socket path, if connecting over a unix socket
    pub unix_socket: Option<String>,
    /// Database to dump
    pub database: String,
    /// Every key/value pair, keys lowercased
    pub params: BTreeMap<String, String>,
}

impl Dsn {
    /// Parses a DSN string.
    ///
    /// # Errors
    /// Returns the matching [`DsnError`] when the string is empty, has no
    /// dialect prefix, names neither a host nor a socket, has no database
    /// name, or carries a non-numeric port.
    ///
    /// # Example
    /// ```rust
    /// use dbdump_core::Dsn;
    ///
    /// let dsn = Dsn::parse("mysql:host=localhost;dbname=shop").unwrap();
    /// assert_eq!(dsn.dialect, "mysql");
    /// assert_eq!(dsn.endpoint(), "localhost");
    /// assert_eq!(dsn.database, "shop");
    /// ```
    pub fn parse(input: &str) -> Result<Self, DsnError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DsnError::Empty);
        }

        let (dialect, rest) = input.split_once(':').ok_or(DsnError::MissingDialect)?;
        let dialect = dialect.trim().to_lowercase();
        if dialect.is_empty() {
            return Err(DsnError::MissingDialect);
        }

        let params: BTreeMap<String, String> = rest
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(key, value)| (key.trim().to_lowercase(), value.trim().to_string()))
            .collect();

        let non_empty = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();
        let host = non_empty("host");
        let unix_socket = non_empty("unix_socket");
        if host.is_none() && unix_socket.is_none() {
            return Err(DsnError::MissingHost);
        }
        let database = non_empty("dbname").ok_or(DsnError::MissingDatabase)?;
        let port = match non_empty("port") {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or(DsnError::InvalidPort(raw))?,
            ),
            None => None,
        };

        Ok(Self {
            dialect,
            host,
            port,
            unix_socket,
            database,
            params,
        })
    }

    /// Host name, or the socket path when no host was given.
    pub fn endpoint(&self) -> &str {
        self.host
            .as_deref()
            .or(self.unix_socket.as_deref())
            .unwrap_or_default()
    }
}

impl std::str::FromStr for Dsn {
    type Err = DsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_dsn() {
        let dsn = Dsn::parse("mysql:host=db.local;port=3307;dbname=shop;charset=utf8").unwrap();
        assert_eq!(dsn.dialect, "mysql");
        assert_eq!(dsn.host.as_deref(), Some("db.local"));
        assert_eq!(dsn.port, Some(3307));
        assert_eq!(dsn.database, "shop");
        assert_eq!(dsn.params.get("charset").map(String::as_str), Some("utf8"));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let dsn = Dsn::parse("MySQL:HOST=localhost;DbName=testdb").unwrap();
        assert_eq!(dsn.dialect, "mysql");
        assert_eq!(dsn.endpoint(), "localhost");
        assert_eq!(dsn.database, "testdb");
    }

    #[test]
    fn test_unix_socket_stands_in_for_host() {
        let dsn = Dsn::parse("mysql:unix_socket=/tmp/mysql.sock;dbname=test").unwrap();
        assert_eq!(dsn.host, None);
        assert_eq!(dsn.endpoint(), "/tmp/mysql.sock");
    }

    #[test]
    fn test_missing_host() {
        assert_eq!(Dsn::parse("mysql:dbname=test"), Err(DsnError::MissingHost));
        assert_eq!(
            Dsn::parse("mysql:host=;dbname=test"),
            Err(DsnError::MissingHost)
        );
    }

    #[test]
    fn test_missing_database() {
        assert_eq!(
            Dsn::parse("mysql:host=localhost"),
            Err(DsnError::MissingDatabase)
        );
    }

    #[test]
    fn test_empty_and_dialectless() {
        assert_eq!(Dsn::parse(""), Err(DsnError::Empty));
        assert_eq!(Dsn::parse("   "), Err(DsnError::Empty));
        assert_eq!(
            Dsn::parse(":host=localhost;dbname=test"),
            Err(DsnError::MissingDialect)
        );
        assert_eq!(
            Dsn::parse("host=localhost;dbname=test"),
            Err(DsnError::MissingDialect)
        );
    }

    #[test]
    fn test_invalid_port() {
        assert_eq!(
            Dsn::parse("mysql:host=localhost;port=abc;dbname=test"),
            Err(DsnError::InvalidPort("abc".to_string()))
        );
        assert!(Dsn::parse("mysql:host=localhost;port=0;dbname=test").is_err());
        assert!(Dsn::parse("mysql:host=localhost;port=70000;dbname=test").is_err());
    }

    #[test]
    fn test_segments_without_equals_are_ignored() {
        let dsn = Dsn::parse("mysql:host=localhost;;junk;dbname=test").unwrap();
        assert_eq!(dsn.params.len(), 2);
    }
}
