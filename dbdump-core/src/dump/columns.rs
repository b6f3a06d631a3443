//! Column classification and column-list SQL.
//!
//! Generated columns never appear in a SELECT or INSERT column list. When a
//! table has one, `complete-insert` is switched on in [`Settings`] for the
//! rest of the run, so every later INSERT names its columns as well.

use crate::{
    Result,
    adapters::DumpAdapter,
    models::{Row, TableColumns},
    settings::Settings,
};

/// Classifies the rows of a `show_columns` query.
///
/// # Errors
/// Returns the adapter's error for a row it cannot classify.
pub fn classify_columns(
    adapter: &dyn DumpAdapter,
    rows: &[Row],
    settings: &mut Settings,
) -> Result<TableColumns> {
    let columns: TableColumns = rows
        .iter()
        .map(|row| adapter.parse_column_type(row))
        .collect::<Result<_>>()?;
    if columns.has_virtual() && !settings.is_enabled("complete-insert") {
        tracing::debug!("Generated column found, switching complete-insert on");
        settings.set_complete_insert(true);
    }
    Ok(columns)
}

/// Column expressions for the row SELECT.
///
/// Generated columns are left out, whatever their type, so the list always
/// lines up with [`column_name_list`]. Under `hex-blob`, bit columns are
/// read as zero-padded hex and other blob columns as hex.
pub fn column_select_list(
    adapter: &dyn DumpAdapter,
    columns: &TableColumns,
    settings: &mut Settings,
) -> Vec<String> {
    let hex_blob = settings.is_enabled("hex-blob");
    let mut selected = Vec::with_capacity(columns.len());
    for column in columns.iter() {
        if column.is_virtual {
            settings.set_complete_insert(true);
        } else if hex_blob && column.type_tag == "bit" {
            selected.push(adapter.select_hex_bit(&column.name));
        } else if hex_blob && column.is_blob {
            selected.push(adapter.select_hex(&column.name));
        } else {
            selected.push(adapter.quote_identifier(&column.name));
        }
    }
    selected
}

/// Quoted column names for a named INSERT, generated columns left out.
pub fn column_name_list(adapter: &dyn DumpAdapter, columns: &TableColumns) -> Vec<String> {
    columns
        .iter()
        .filter(|column| !column.is_virtual)
        .map(|column| adapter.quote_identifier(&column.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mysql::MySqlDumpAdapter;
    use serde_json::json;

    fn show_columns_row(field: &str, type_sql: &str, extra: &str) -> Row {
        Row::new()
            .with("Field", field)
            .with("Type", type_sql)
            .with("Extra", extra)
    }

    fn settings(raw: serde_json::Value) -> Settings {
        Settings::new(raw.as_object().cloned().unwrap_or_default()).unwrap()
    }

    fn rows() -> Vec<Row> {
        vec![
            show_columns_row("id", "int(11)", "auto_increment"),
            show_columns_row("flags", "bit(8)", ""),
            show_columns_row("avatar", "blob", ""),
            show_columns_row("total", "int(11)", "STORED GENERATED"),
        ]
    }

    #[test]
    fn test_generated_column_enables_complete_insert() {
        let mut settings = settings(json!({}));
        let adapter = MySqlDumpAdapter::new(&settings);
        assert!(!settings.is_enabled("complete-insert"));
        let columns = classify_columns(&adapter, &rows(), &mut settings).unwrap();
        assert_eq!(columns.len(), 4);
        assert!(settings.is_enabled("complete-insert"));
    }

    #[test]
    fn test_plain_table_leaves_complete_insert_off() {
        let mut settings = settings(json!({}));
        let adapter = MySqlDumpAdapter::new(&settings);
        let plain = vec![show_columns_row("id", "int", "")];
        classify_columns(&adapter, &plain, &mut settings).unwrap();
        assert!(!settings.is_enabled("complete-insert"));
    }

    #[test]
    fn test_select_list_with_hex_blob() {
        let mut settings = settings(json!({ "hex-blob": true }));
        let adapter = MySqlDumpAdapter::new(&settings);
        let columns = classify_columns(&adapter, &rows(), &mut settings).unwrap();
        assert_eq!(
            column_select_list(&adapter, &columns, &mut settings),
            vec![
                "`id`".to_string(),
                "LPAD(HEX(`flags`),2,'0') AS `flags`".to_string(),
                "HEX(`avatar`) AS `avatar`".to_string(),
            ]
        );
    }

    #[test]
    fn test_select_list_without_hex_blob() {
        let mut settings = settings(json!({}));
        let adapter = MySqlDumpAdapter::new(&settings);
        let columns = classify_columns(&adapter, &rows(), &mut settings).unwrap();
        assert_eq!(
            column_select_list(&adapter, &columns, &mut settings),
            vec!["`id`", "`flags`", "`avatar`"]
        );
        assert_eq!(
            column_name_list(&adapter, &columns),
            vec!["`id`", "`flags`", "`avatar`"]
        );
    }

    #[test]
    fn test_generated_blob_left_out_under_hex_blob() {
        let mut settings = settings(json!({ "hex-blob": true }));
        let adapter = MySqlDumpAdapter::new(&settings);
        let rows = vec![
            show_columns_row("id", "int(11)", ""),
            show_columns_row("thumb", "blob", "VIRTUAL GENERATED"),
            show_columns_row("mask", "bit(4)", "STORED GENERATED"),
        ];
        let columns = classify_columns(&adapter, &rows, &mut settings).unwrap();
        assert_eq!(column_select_list(&adapter, &columns, &mut settings), vec!["`id`"]);
        assert_eq!(column_name_list(&adapter, &columns), vec!["`id`"]);
    }
}
