//! Validated dump settings.
//!
//! [`Settings`] is built once from a raw option map (JSON object) and is
//! read-only afterwards, with two exceptions used mid-run:
//! [`Settings::set_included_tables`] records include-table entries left
//! unmatched by enumeration, and [`Settings::set_complete_insert`] is flipped
//! on when a generated column is found. Once any table needs column-named
//! inserts, every later table gets them too, which keeps the dump uniform.
//!
//! # Example
//! ```rust
//! use dbdump_core::Settings;
//! use serde_json::json;
//!
//! let raw = json!({ "exclude-tables": ["/^tmp_/"], "hex-blob": true });
//! let settings = Settings::new(raw.as_object().cloned().unwrap_or_default()).unwrap();
//!
//! assert!(settings.is_enabled("hex-blob"));
//! assert!(settings.is_enabled("extended-insert"));
//! assert!(settings.exclude_tables().matches("tmp_sessions"));
//! ```

mod options;


pub use options::{DefaultValue, OPTIONS, OptionKind, OptionSpec, lookup};

use crate::{Result, error::DumpError, matcher::NameMatcher};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Output compression selected by the `compress` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressMethod {
    #[default]
    None,
    Gzip,
    Bzip2,
    Zstandard,
    Lz4,
}

impl CompressMethod {
    /// Parses a normalized `compress` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "gzip" => Some(Self::Gzip),
            "bzip2" => Some(Self::Bzip2),
            "zstandard" | "zstd" => Some(Self::Zstandard),
            "lz4" => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Canonical option value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Zstandard => "zstandard",
            Self::Lz4 => "lz4",
        }
    }
}

/// Character set declared by the dump preamble and session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterSet {
    #[default]
    Utf8,
    Utf8mb4,
}

impl CharacterSet {
    /// SQL name of the character set.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Utf8mb4 => "utf8mb4",
        }
    }
}

impl std::fmt::Display for CharacterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which tables have their rows skipped.
#[derive(Debug, Clone, Default)]
pub enum NoData {
    /// Rows of every table are dumped
    #[default]
    Off,
    /// No table rows are dumped
    All,
    /// Rows are skipped for matching tables
    Matching(NameMatcher),
}

impl NoData {
    /// Whether rows of `table` are skipped.
    pub fn skips(&self, table: &str) -> bool {
        match self {
            NoData::Off => false,
            NoData::All => true,
            NoData::Matching(matcher) => matcher.matches(table),
        }
    }
}

/// PHP-style truthiness used by [`Settings::is_enabled`].
///
/// False for `null`, `false`, `0`, `""`, `"0"`, empty lists and empty
/// objects; true otherwise.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty() && text != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Validated, resolved dump settings.
#[derive(Debug, Clone)]
pub struct Settings {
    values: BTreeMap<&'static str, Value>,
    include_tables: Vec<String>,
    include_views: Vec<String>,
    exclude_tables: NameMatcher,
    no_data: NoData,
    compress: CompressMethod,
    character_set: CharacterSet,
}

impl Default for Settings {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        for spec in OPTIONS {
            if let Some(value) = default_for(spec, &values) {
                values.insert(spec.key, value);
            }
        }
        Self {
            values,
            include_tables: Vec::new(),
            include_views: Vec::new(),
            exclude_tables: NameMatcher::default(),
            no_data: NoData::Off,
            compress: CompressMethod::None,
            character_set: CharacterSet::Utf8,
        }
    }
}

impl Settings {
    /// Validates a raw option map and resolves defaults.
    ///
    /// # Errors
    /// Returns [`DumpError::Configuration`] if:
    /// - a key is not a recognized option
    /// - a value has the wrong shape or is out of range
    /// - both `replace` and `insert-ignore` are enabled
    /// - a `/regex/` pattern in `exclude-tables` or `no-data` does not compile
    pub fn new(raw: Map<String, Value>) -> Result<Self> {
        let mut unknown: Vec<&str> = raw
            .keys()
            .filter(|key| lookup(key).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(DumpError::configuration(format!(
                "Unexpected value in dump settings: ({})",
                unknown.join(",")
            )));
        }

        let mut values = BTreeMap::new();
        for spec in OPTIONS {
            if let Some(value) = raw.get(spec.key) {
                if let Some(notice) = spec.deprecation {
                    tracing::warn!("Option '{}' is deprecated: {}", spec.key, notice);
                }
                values.insert(spec.key, spec.validate(value)?);
            }
        }
        // Second pass so inherited defaults see explicitly set values.
        for spec in OPTIONS {
            if !values.contains_key(spec.key) {
                if let Some(value) = default_for(spec, &values) {
                    values.insert(spec.key, value);
                }
            }
        }

        let enabled = |key: &str| values.get(key).is_some_and(truthy);
        if enabled("replace") && enabled("insert-ignore") {
            return Err(DumpError::configuration(
                "replace and insert-ignore are mutually exclusive",
            ));
        }

        let include_tables = names(values.get("include-tables"));
        let include_views = names(values.get("include-views"));
        let exclude_tables = NameMatcher::new(&names(values.get("exclude-tables")))?;
        let no_data = match values.get("no-data") {
            Some(Value::Array(_)) => {
                NoData::Matching(NameMatcher::new(&names(values.get("no-data")))?)
            }
            Some(value) if truthy(value) => NoData::All,
            _ => NoData::Off,
        };
        let compress = values
            .get("compress")
            .and_then(Value::as_str)
            .and_then(CompressMethod::from_name)
            .unwrap_or_default();
        let character_set = match values.get("default-character-set").and_then(Value::as_str) {
            Some("utf8mb4") => CharacterSet::Utf8mb4,
            _ => CharacterSet::Utf8,
        };

        tracing::debug!(
            "Resolved {} dump settings ({} set explicitly)",
            values.len(),
            raw.len()
        );

        Ok(Self {
            values,
            include_tables,
            include_views,
            exclude_tables,
            no_data,
            compress,
            character_set,
        })
    }

    /// Resolved value of an option.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Truthiness of an option's resolved value; false when unset.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(truthy)
    }

    /// Session setup statements run right after connecting.
    ///
    /// The character set statement is always present; the UTC time zone
    /// statement is dropped by `skip-tz-utc`.
    pub fn init_commands(&self) -> Vec<String> {
        let mut commands = vec![format!("SET NAMES {}", self.character_set)];
        if !self.is_enabled("skip-tz-utc") {
            commands.push("SET TIME_ZONE='+00:00'".to_string());
        }
        commands
    }

    /// Selected output compression.
    pub fn compress(&self) -> CompressMethod {
        self.compress
    }

    /// Compression level in `0..=9`.
    pub fn compress_level(&self) -> u32 {
        self.int("compress-level").try_into().unwrap_or(6)
    }

    /// Declared character set.
    pub fn default_character_set(&self) -> CharacterSet {
        self.character_set
    }

    /// Byte budget of one extended INSERT statement.
    pub fn net_buffer_length(&self) -> usize {
        self.int("net_buffer_length")
            .try_into()
            .unwrap_or(usize::MAX)
    }

    /// Tables to dump; empty means all.
    pub fn include_tables(&self) -> &[String] {
        &self.include_tables
    }

    /// Views to dump; empty means all.
    pub fn include_views(&self) -> &[String] {
        &self.include_views
    }

    /// Tables and views left out of the dump entirely.
    pub fn exclude_tables(&self) -> &NameMatcher {
        &self.exclude_tables
    }

    /// Tables whose rows are skipped.
    pub fn no_data(&self) -> &NoData {
        &self.no_data
    }

    /// Default row filter; `None` when empty.
    pub fn default_where(&self) -> Option<&str> {
        self.values
            .get("where")
            .and_then(Value::as_str)
            .filter(|condition| !condition.is_empty())
    }

    /// Replaces the include-table list.
    pub fn set_included_tables(&mut self, tables: Vec<String>) {
        self.values.insert(
            "include-tables",
            Value::Array(tables.iter().cloned().map(Value::String).collect()),
        );
        self.include_tables = tables;
    }

    /// Turns column-named inserts on or off for the rest of the run.
    pub fn set_complete_insert(&mut self, enabled: bool) {
        self.values.insert("complete-insert", Value::Bool(enabled));
    }

    fn int(&self, key: &str) -> u64 {
        self.values.get(key).and_then(Value::as_u64).unwrap_or_default()
    }
}

fn default_for(spec: &OptionSpec, resolved: &BTreeMap<&'static str, Value>) -> Option<Value> {
    match spec.default {
        DefaultValue::Bool(flag) => Some(Value::Bool(flag)),
        DefaultValue::Int(number) => Some(Value::from(number)),
        DefaultValue::Text(text) => Some(Value::String(text.to_string())),
        DefaultValue::EmptyList => Some(Value::Array(Vec::new())),
        DefaultValue::Inherit(source) => resolved.get(source).cloned(),
    }
}

fn names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
