//! MySQL column type classification.
//!
//! Maps the `Type` and `Extra` columns of `SHOW COLUMNS` output to a
//! [`ColumnType`] descriptor: numeric values are written unquoted, blob
//! values are selected as hex under `hex-blob`, and generated columns are
//! left out of both the SELECT and the INSERT column lists.

use crate::models::ColumnType;

/// Type tags whose values are emitted without quotes.
///
/// `bit` values are raw bytes on the wire, so the escaper renders them as
/// `b'...'` literals (or `0x...` under `hex-blob`) before this list applies.
pub const NUMERIC_TYPES: &[&str] = &[
    "bit", "tinyint", "smallint", "mediumint", "int", "integer", "bigint", "real", "double",
    "float", "decimal", "numeric",
];

/// Type tags selected as hex strings when `hex-blob` is on.
pub const BLOB_TYPES: &[&str] = &[
    "tinyblob",
    "blob",
    "mediumblob",
    "longblob",
    "binary",
    "varbinary",
    "bit",
    "geometry",
    "point",
    "linestring",
    "polygon",
    "multipoint",
    "multilinestring",
    "multipolygon",
    "geometrycollection",
];

/// Markers in the `Extra` column identifying generated columns.
const GENERATED_MARKERS: &[&str] = &["VIRTUAL GENERATED", "STORED GENERATED"];

/// Extracts the normalized type tag from a raw MySQL type.
///
/// The tag is the leading word with any length or value list stripped:
/// `int(10) unsigned` gives `int`, `enum('a','b')` gives `enum`.
///
/// # Example
/// ```rust
/// use dbdump_core::adapters::mysql::type_tag;
///
/// assert_eq!(type_tag("int(10) unsigned"), "int");
/// assert_eq!(type_tag("LONGBLOB"), "longblob");
/// ```
pub fn type_tag(type_sql: &str) -> String {
    let first_word = type_sql.trim().split(' ').next().unwrap_or_default();
    let base = first_word
        .split_once('(')
        .map_or(first_word, |(base, _)| base);
    base.to_lowercase()
}

/// Whether an `Extra` value marks a generated column.
pub fn is_generated(extra: &str) -> bool {
    let extra = extra.to_uppercase();
    GENERATED_MARKERS.iter().any(|marker| extra.contains(marker))
}

/// Builds a column descriptor from a name, raw type and `Extra` value.
pub fn classify_mysql_column(name: &str, type_sql: &str, extra: &str) -> ColumnType {
    let tag = type_tag(type_sql);
    ColumnType {
        name: name.to_string(),
        is_numeric: NUMERIC_TYPES.contains(&tag.as_str()),
        is_blob: BLOB_TYPES.contains(&tag.as_str()),
        is_virtual: is_generated(extra),
        type_tag: tag,
        type_sql: type_sql.to_string(),
    }
}
