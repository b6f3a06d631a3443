//! Comment blocks written into the dump.

use chrono::{DateTime, Local};

/// Dump header naming the tool, host, database, server version and date.
pub fn header(host: &str, database: &str, server_version: &str, date: Option<DateTime<Local>>) -> String {
    let mut out = format!(
        "-- dbdump {}\n--\n-- Host: {}\tDatabase: {}\n\
         -- ------------------------------------------------------\n\
         -- Server version \t{}\n",
        env!("CARGO_PKG_VERSION"),
        host,
        database,
        server_version
    );
    if let Some(date) = date {
        out.push_str(&format!("-- Date: {}\n", date.to_rfc2822()));
    }
    out.push('\n');
    out
}

/// Closing line of a complete dump.
pub fn footer(date: Option<DateTime<Local>>) -> String {
    match date {
        Some(date) => format!("-- Dump completed on: {}\n", date.to_rfc2822()),
        None => "-- Dump completed\n".to_string(),
    }
}

/// A `--` framed comment block.
pub fn section(title: &str) -> String {
    format!("--\n-- {}\n--\n\n", title)
}

/// Row-count summary closing a table's data section.
pub fn table_summary(quoted_table: &str, rows: u64) -> String {
    format!("-- Dumped table {} with {} row(s)\n--\n\n", quoted_table, rows)
}
