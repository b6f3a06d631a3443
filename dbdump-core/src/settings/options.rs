//! Static registry of recognized dump options.
//!
//! Each option carries its value kind, default, and an optional deprecation
//! notice. The table is compiled once into a lookup map and consulted by
//! [`Settings::new`](super::Settings::new).

use crate::{Result, error::DumpError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Accepted value shape of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Any scalar, read through truthiness
    Flag,
    /// Array of strings
    List,
    /// Boolean (all tables) or array of names/patterns
    NoData,
    /// Free-form string
    Text,
    /// One of a fixed set of strings, compared case-insensitively
    Choice(&'static [&'static str]),
    /// Integer within an inclusive range
    Range { min: u64, max: u64 },
}

/// Default applied when an option is absent from the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Bool(bool),
    Int(u64),
    Text(&'static str),
    EmptyList,
    /// Copies the resolved value of another option
    Inherit(&'static str),
}

/// Descriptor of one recognized option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
    pub default: DefaultValue,
    pub deprecation: Option<&'static str>,
}

/// Compression method names; `zstd` is accepted as an alias of `zstandard`.
pub const COMPRESS_METHODS: &[&str] = &["none", "gzip", "bzip2", "zstandard", "zstd", "lz4"];

/// Character sets the dump preamble may declare.
pub const CHARACTER_SETS: &[&str] = &["utf8", "utf8mb4"];

const fn flag(key: &'static str, default: bool) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::Flag,
        default: DefaultValue::Bool(default),
        deprecation: None,
    }
}

const fn list(key: &'static str, default: DefaultValue) -> OptionSpec {
    OptionSpec {
        key,
        kind: OptionKind::List,
        default,
        deprecation: None,
    }
}

/// Every option the dump understands.
pub const OPTIONS: &[OptionSpec] = &[
    OptionSpec {
        key: "compress",
        kind: OptionKind::Choice(COMPRESS_METHODS),
        default: DefaultValue::Text("none"),
        deprecation: None,
    },
    OptionSpec {
        key: "compress-level",
        kind: OptionKind::Range { min: 0, max: 9 },
        default: DefaultValue::Int(6),
        deprecation: None,
    },
    OptionSpec {
        key: "default-character-set",
        kind: OptionKind::Choice(CHARACTER_SETS),
        default: DefaultValue::Text("utf8"),
        deprecation: None,
    },
    list("include-tables", DefaultValue::EmptyList),
    list("exclude-tables", DefaultValue::EmptyList),
    list("include-views", DefaultValue::Inherit("include-tables")),
    OptionSpec {
        key: "no-data",
        kind: OptionKind::NoData,
        default: DefaultValue::Bool(false),
        deprecation: None,
    },
    OptionSpec {
        key: "net_buffer_length",
        kind: OptionKind::Range {
            min: 1024,
            max: u32::MAX as u64,
        },
        default: DefaultValue::Int(1_000_000),
        deprecation: None,
    },
    OptionSpec {
        key: "where",
        kind: OptionKind::Text,
        default: DefaultValue::Text(""),
        deprecation: None,
    },
    flag("add-drop-database", false),
    flag("add-drop-table", false),
    flag("add-drop-trigger", false),
    flag("add-locks", true),
    flag("complete-insert", false),
    flag("databases", false),
    flag("disable-keys", true),
    flag("events", false),
    flag("extended-insert", true),
    flag("hex-blob", false),
    flag("if-not-exists", false),
    flag("insert-ignore", false),
    flag("lock-tables", false),
    flag("no-autocommit", false),
    flag("no-create-db", false),
    flag("no-create-info", false),
    flag("replace", false),
    flag("reset-auto-increment", false),
    flag("routines", false),
    flag("single-transaction", false),
    flag("skip-comments", false),
    flag("skip-definer", false),
    flag("skip-dump-date", false),
    flag("skip-triggers", false),
    flag("skip-tz-utc", false),
    OptionSpec {
        key: "disable-foreign-keys-check",
        kind: OptionKind::Flag,
        default: DefaultValue::Bool(true),
        deprecation: Some("foreign key checks are always disabled by the dump preamble"),
    },
];

/// Lookup map over [`OPTIONS`], built on first use.
pub fn registry() -> &'static HashMap<&'static str, &'static OptionSpec> {
    static REGISTRY: OnceLock<HashMap<&'static str, &'static OptionSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| OPTIONS.iter().map(|spec| (spec.key, spec)).collect())
}

/// Finds the descriptor of a recognized option.
pub fn lookup(key: &str) -> Option<&'static OptionSpec> {
    registry().get(key).copied()
}

impl OptionSpec {
    /// Checks a raw value against the option kind and returns it normalized.
    ///
    /// # Errors
    /// Returns a configuration error naming the option when the value has
    /// the wrong shape or lies outside the allowed set or range.
    pub fn validate(&self, value: &Value) -> Result<Value> {
        match self.kind {
            OptionKind::Flag => match value {
                Value::Array(_) | Value::Object(_) => Err(DumpError::configuration(format!(
                    "{} must be a boolean",
                    self.key
                ))),
                scalar => Ok(scalar.clone()),
            },
            OptionKind::List => string_list(self.key, value).map(Value::Array),
            OptionKind::NoData => match value {
                Value::Array(_) => string_list(self.key, value).map(Value::Array),
                Value::Bool(_) | Value::Null => Ok(Value::Bool(super::truthy(value))),
                _ => Err(DumpError::configuration(format!(
                    "{} must be a boolean or a list of table names",
                    self.key
                ))),
            },
            OptionKind::Text => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Null => Ok(Value::String(String::new())),
                _ => Err(DumpError::configuration(format!(
                    "{} must be a string",
                    self.key
                ))),
            },
            OptionKind::Choice(allowed) => {
                let choice = value
                    .as_str()
                    .map(str::to_lowercase)
                    .filter(|choice| allowed.contains(&choice.as_str()))
                    .ok_or_else(|| {
                        DumpError::configuration(format!(
                            "{} must be one of {}, got {}",
                            self.key,
                            allowed.join(", "),
                            value
                        ))
                    })?;
                Ok(Value::String(choice))
            }
            OptionKind::Range { min, max } => {
                let number = match value {
                    Value::Number(number) => number.as_u64(),
                    Value::String(text) => text.trim().parse::<u64>().ok(),
                    _ => None,
                }
                .filter(|n| (min..=max).contains(n))
                .ok_or_else(|| {
                    DumpError::configuration(format!(
                        "{} must be an integer between {} and {}, got {}",
                        self.key, min, max, value
                    ))
                })?;
                Ok(Value::from(number))
            }
        }
    }
}

fn string_list(key: &str, value: &Value) -> Result<Vec<Value>> {
    let items = value.as_array().ok_or_else(|| {
        DumpError::configuration(format!("{} must be a list of names", key))
    })?;
    items
        .iter()
        .map(|item| match item {
            Value::String(_) => Ok(item.clone()),
            _ => Err(DumpError::configuration(format!(
                "{} must contain only strings, got {}",
                key, item
            ))),
        })
        .collect()
}
