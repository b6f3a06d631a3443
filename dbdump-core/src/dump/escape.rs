//! Value escaping for INSERT tuples.
//!
//! Values are raw bytes, so binary column data reaches the dump unchanged
//! apart from literal quoting.

use crate::models::ColumnType;
use crate::source::QuoteFn;

/// Turns one raw column value into dump-safe literal bytes.
///
/// - NULL becomes `NULL`
/// - a bit column becomes `0x<hex>` under `hex-blob` (the query already
///   selected it as hex), else a `b'<bits>'` literal built from its bytes
/// - under `hex-blob`, another blob column becomes `0x<hex>`, or `''` when
///   an empty value was read
/// - a numeric column is written as-is
/// - everything else, including columns without a descriptor, is quoted
///
/// # Example
/// ```rust
/// use dbdump_core::dump::escape::escape;
/// use dbdump_core::source::mysql::quote_string;
///
/// assert_eq!(escape(None, None, false, quote_string), b"NULL");
/// assert_eq!(escape(Some(b"it's"), None, false, quote_string), br"'it\'s'");
/// ```
pub fn escape(
    value: Option<&[u8]>,
    column: Option<&ColumnType>,
    hex_blob: bool,
    quote: QuoteFn,
) -> Vec<u8> {
    let Some(value) = value else {
        return b"NULL".to_vec();
    };
    match column {
        Some(column) if column.type_tag == "bit" => {
            if hex_blob {
                [b"0x".as_slice(), value].concat()
            } else {
                bit_literal(value)
            }
        }
        Some(column) if hex_blob && column.is_blob => {
            if value.is_empty() {
                b"''".to_vec()
            } else {
                [b"0x".as_slice(), value].concat()
            }
        }
        Some(column) if column.is_numeric => value.to_vec(),
        _ => quote(value),
    }
}

/// Renders the big-endian bytes of a bit value as `b'<bits>'` without
/// leading zeros.
fn bit_literal(value: &[u8]) -> Vec<u8> {
    let bits: String = value.iter().map(|byte| format!("{:08b}", byte)).collect();
    let trimmed = bits.trim_start_matches('0');
    let digits = if trimmed.is_empty() && !bits.is_empty() {
        "0"
    } else {
        trimmed
    };
    format!("b'{}'", digits).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mysql::quote_string;

    fn column(type_tag: &str, is_numeric: bool, is_blob: bool) -> ColumnType {
        ColumnType {
            name: "c".to_string(),
            is_numeric,
            is_blob,
            is_virtual: false,
            type_tag: type_tag.to_string(),
            type_sql: type_tag.to_string(),
        }
    }

    fn text(value: Option<&[u8]>, column: Option<&ColumnType>, hex_blob: bool) -> String {
        String::from_utf8(escape(value, column, hex_blob, quote_string)).unwrap()
    }

    #[test]
    fn test_null_wins_over_type() {
        let int = column("int", true, false);
        assert_eq!(text(None, Some(&int), true), "NULL");
    }

    #[test]
    fn test_numeric_passthrough() {
        let int = column("int", true, false);
        assert_eq!(text(Some(b"42"), Some(&int), false), "42");
        assert_eq!(text(Some(b"-1.5"), Some(&int), true), "-1.5");
    }

    #[test]
    fn test_hex_blob() {
        let blob = column("blob", false, true);
        assert_eq!(text(Some(b"DEADBEEF"), Some(&blob), true), "0xDEADBEEF");
        assert_eq!(text(Some(b""), Some(&blob), true), "''");

        let bit = column("bit", true, true);
        assert_eq!(text(Some(b""), Some(&bit), true), "0x");
        assert_eq!(text(Some(b"01"), Some(&bit), true), "0x01");
    }

    #[test]
    fn test_binary_blob_without_hex_mode_keeps_bytes() {
        let blob = column("blob", false, true);
        assert_eq!(text(Some(b"raw"), Some(&blob), false), "'raw'");
        assert_eq!(
            escape(Some(&[0xff, 0x00, b'\'']), Some(&blob), false, quote_string),
            vec![b'\'', 0xff, b'\\', b'0', b'\\', b'\'', b'\'']
        );
    }

    #[test]
    fn test_bit_without_hex_mode_is_bit_literal() {
        let bit = column("bit", true, true);
        assert_eq!(text(Some(&[0x01]), Some(&bit), false), "b'1'");
        assert_eq!(text(Some(&[0x02, 0x80]), Some(&bit), false), "b'1010000000'");
        assert_eq!(text(Some(&[0x00]), Some(&bit), false), "b'0'");
    }

    #[test]
    fn test_text_and_unknown_columns_are_quoted() {
        let text_column = column("varchar", false, false);
        assert_eq!(text(Some(b"a'b"), Some(&text_column), false), r"'a\'b'");
        assert_eq!(text(Some(b"7"), None, false), "'7'");
    }
}
