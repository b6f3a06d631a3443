//! Shared fixtures for the dump pipeline tests.
//!
//! `ScriptedSource` answers queries from a table of canned rows, so the
//! whole pipeline runs without a database.

#![allow(clippy::unwrap_used, dead_code)]

use async_trait::async_trait;
use dbdump_core::{
    DataSource, DumpError, ObjectKind, Result, Row, Settings,
    adapters::{DumpAdapter, mysql::MySqlDumpAdapter},
    source::{QuoteFn, mysql::quote_string},
};
use futures::{StreamExt, stream::BoxStream};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

pub const DSN: &str = "mysql:host=localhost;dbname=shop";
pub const DATABASE: &str = "shop";

/// Data source answering from canned rows.
///
/// Unscripted queries return no rows. Clones share the statement log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    responses: HashMap<String, Vec<Row>>,
    failing: Option<String>,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    /// Source answering the server version query only.
    pub fn new() -> Self {
        Self::default().respond(
            "SELECT VERSION()",
            vec![Row::new().with("VERSION()", "8.0.36")],
        )
    }

    /// Scripts the rows of one query.
    pub fn respond(mut self, sql: impl Into<String>, rows: Vec<Row>) -> Self {
        self.responses.insert(sql.into(), rows);
        self
    }

    /// Makes one query or statement fail.
    pub fn fail_on(mut self, sql: impl Into<String>) -> Self {
        self.failing = Some(sql.into());
        self
    }

    /// Scripts the listing of one object kind.
    pub fn with_objects(self, kind: ObjectKind, names: &[&str]) -> Self {
        let adapter = adapter();
        let rows = names
            .iter()
            .map(|name| match kind {
                ObjectKind::Trigger => Row::new().with("Trigger", *name).with("Event", "INSERT"),
                _ => Row::new().with("name", *name),
            })
            .collect();
        self.respond(adapter.list_objects(kind, DATABASE), rows)
    }

    /// Scripts a table's columns, definition and rows.
    pub fn with_table(
        self,
        table: &str,
        columns: &[(&str, &str, &str)],
        create: &str,
        rows: Vec<Row>,
    ) -> Self {
        let adapter = adapter();
        let column_rows = columns
            .iter()
            .map(|(field, type_sql, extra)| {
                Row::new()
                    .with("Field", *field)
                    .with("Type", *type_sql)
                    .with("Null", "YES")
                    .with("Key", "")
                    .with_null("Default")
                    .with("Extra", *extra)
            })
            .collect();
        let select_list: Vec<String> = columns
            .iter()
            .filter(|(_, _, extra)| !extra.contains("GENERATED"))
            .map(|(field, _, _)| adapter.quote_identifier(field))
            .collect();
        let select = format!(
            "SELECT {} FROM {}",
            select_list.join(","),
            adapter.quote_identifier(table)
        );
        self.respond(adapter.show_columns(table), column_rows)
            .respond(
                adapter.show_create(ObjectKind::Table, table),
                vec![Row::new().with("Table", table).with("Create Table", create)],
            )
            .respond(select, rows)
    }

    /// Every statement and query seen, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.log.lock().unwrap().push(sql.to_string());
        if self.failing.as_deref() == Some(sql) {
            return Err(DumpError::query_failed(
                format!("Query failed: {}", sql),
                std::io::Error::other("scripted failure"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        self.record(sql)
    }

    fn fetch<'a>(&'a mut self, sql: &'a str) -> BoxStream<'a, Result<Row>> {
        let rows: Vec<Result<Row>> = match self.record(sql) {
            Ok(()) => self
                .responses
                .get(sql)
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(Ok)
                .collect(),
            Err(e) => vec![Err(e)],
        };
        futures::stream::iter(rows).boxed()
    }

    fn quoter(&self) -> QuoteFn {
        quote_string
    }
}

/// MySQL adapter with default settings, for computing expected SQL.
pub fn adapter() -> MySqlDumpAdapter {
    MySqlDumpAdapter::new(&Settings::default())
}

/// Settings from a JSON object literal.
pub fn settings(raw: serde_json::Value) -> Settings {
    Settings::new(raw.as_object().cloned().unwrap_or_default()).unwrap()
}

/// A two-column `users` table with two rows.
pub fn users_source() -> ScriptedSource {
    ScriptedSource::new()
        .with_objects(ObjectKind::Table, &["users"])
        .with_table(
            "users",
            &[("id", "int(11)", "auto_increment"), ("name", "varchar(64)", "")],
            "CREATE TABLE `users` (\n  `id` int(11) NOT NULL AUTO_INCREMENT,\n  `name` varchar(64) DEFAULT NULL,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB",
            vec![
                Row::new().with("id", "1").with("name", "a"),
                Row::new().with("id", "2").with("name", "b"),
            ],
        )
}
