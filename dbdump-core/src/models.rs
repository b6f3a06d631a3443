//! Core data models shared by the dump pipeline.
//!
//! Rows, per-column type descriptors, schema object name lists and the
//! small value types the orchestrator passes between components.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Kinds of schema objects the dump covers, in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    View,
    Trigger,
    Procedure,
    Function,
    Event,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Table => write!(f, "table"),
            ObjectKind::View => write!(f, "view"),
            ObjectKind::Trigger => write!(f, "trigger"),
            ObjectKind::Procedure => write!(f, "procedure"),
            ObjectKind::Function => write!(f, "function"),
            ObjectKind::Event => write!(f, "event"),
        }
    }
}

/// A single result row: ordered `(column, value)` pairs, `None` being NULL.
///
/// Values are the raw bytes the server sent. Metadata lookups go through
/// [`Row::value`], which reads them as text; table data keeps its bytes so
/// binary columns survive the dump unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    fields: Vec<(String, Option<Vec<u8>>)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method appending a non-NULL field.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.fields.push((column.into(), Some(value.into())));
        self
    }

    /// Builder method appending a NULL field.
    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.fields.push((column.into(), None));
        self
    }

    /// Appends a field.
    pub fn push(&mut self, column: impl Into<String>, value: Option<Vec<u8>>) {
        self.fields.push((column.into(), value));
    }

    /// Looks up a field's bytes; the outer `None` means the column is absent.
    pub fn get(&self, column: &str) -> Option<Option<&[u8]>> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }

    /// Non-NULL value of a column as text, if present and valid UTF-8.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column)
            .flatten()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Non-NULL value of the first column as text.
    pub fn first(&self) -> Option<&str> {
        self.fields
            .first()
            .and_then(|(_, value)| value.as_deref())
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Replaces the value of an existing column; returns false if absent.
    pub fn set(&mut self, column: &str, value: Option<Vec<u8>>) -> bool {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some(field) => {
                field.1 = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[u8]>)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl IntoIterator for Row {
    type Item = (String, Option<Vec<u8>>);
    type IntoIter = std::vec::IntoIter<(String, Option<Vec<u8>>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Classification of one column, driving value escaping and column selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    /// Column name
    pub name: String,
    /// Value is emitted unquoted
    pub is_numeric: bool,
    /// Value is selected and emitted as hex when hex-blob is on
    pub is_blob: bool,
    /// Generated column; never selected or inserted
    pub is_virtual: bool,
    /// Dialect-normalized type tag, e.g. `int`, `bit`, `varchar`
    pub type_tag: String,
    /// Raw dialect type, e.g. `int(10) unsigned`
    pub type_sql: String,
}

/// Column descriptors of one table or view, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumns {
    columns: Vec<ColumnType>,
}

impl TableColumns {
    /// Creates an empty descriptor list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column descriptor.
    pub fn push(&mut self, column: ColumnType) {
        self.columns.push(column);
    }

    /// Looks up a descriptor by column name.
    pub fn get(&self, name: &str) -> Option<&ColumnType> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Iterates over descriptors in column order.
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnType> {
        self.columns.iter()
    }

    /// Whether any column is generated.
    pub fn has_virtual(&self) -> bool {
        self.columns.iter().any(|column| column.is_virtual)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ColumnType> for TableColumns {
    fn from_iter<I: IntoIterator<Item = ColumnType>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Names of discovered schema objects, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObjects {
    pub tables: Vec<String>,
    pub views: Vec<String>,
    pub triggers: Vec<String>,
    pub procedures: Vec<String>,
    pub functions: Vec<String>,
    pub events: Vec<String>,
}

impl SchemaObjects {
    /// Name list for one object kind.
    pub fn names(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Table => &self.tables,
            ObjectKind::View => &self.views,
            ObjectKind::Trigger => &self.triggers,
            ObjectKind::Procedure => &self.procedures,
            ObjectKind::Function => &self.functions,
            ObjectKind::Event => &self.events,
        }
    }

    /// Mutable name list for one object kind.
    pub fn names_mut(&mut self, kind: ObjectKind) -> &mut Vec<String> {
        match kind {
            ObjectKind::Table => &mut self.tables,
            ObjectKind::View => &mut self.views,
            ObjectKind::Trigger => &mut self.triggers,
            ObjectKind::Procedure => &mut self.procedures,
            ObjectKind::Function => &mut self.functions,
            ObjectKind::Event => &mut self.events,
        }
    }

    /// Total number of discovered objects.
    pub fn object_count(&self) -> usize {
        [
            &self.tables,
            &self.views,
            &self.triggers,
            &self.procedures,
            &self.functions,
            &self.events,
        ]
        .iter()
        .map(|names| names.len())
        .sum()
    }
}

/// Row limit applied to a table's SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableLimit {
    /// `LIMIT count`
    Count(u64),
    /// `LIMIT offset,count`
    Range { offset: u64, count: u64 },
}

impl TableLimit {
    /// Parses a caller-supplied limit leniently.
    ///
    /// A non-negative integer (or numeric string) is a row count and a
    /// two-element numeric array is `[offset, count]`. Any other shape means
    /// "no limit" rather than an error.
    pub fn parse(raw: &Value) -> Option<Self> {
        match raw {
            Value::Array(items) if items.len() == 2 => {
                let offset = numeric(&items[0])?;
                let count = numeric(&items[1])?;
                Some(Self::Range { offset, count })
            }
            Value::Array(_) => None,
            other => numeric(other).map(Self::Count),
        }
    }
}

impl std::fmt::Display for TableLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableLimit::Count(count) => write!(f, "{}", count),
            TableLimit::Range { offset, count } => write!(f, "{},{}", offset, count),
        }
    }
}

fn numeric(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Where the dump is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Standard output
    Stdout,
    /// A file path, created or truncated
    Path(PathBuf),
}

impl Destination {
    /// Maps an empty string or `-` to stdout, anything else to a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.is_empty() || arg == "-" {
            Self::Stdout
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Stdout => write!(f, "<stdout>"),
            Destination::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Summary passed to the info hook after a table's rows are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDumpInfo {
    pub name: String,
    pub row_count: u64,
}
