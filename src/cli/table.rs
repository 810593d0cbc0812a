//! # ASCII Table Formatter
//!
//! Renders fetched rows and context sequences as ASCII tables:
//!
//! ```text
//! +-------+-------+
//! | bugid | title |
//! +-------+-------+
//! | 1     | crash |
//! | 2     | hang  |
//! +-------+-------+
//! ```
//!
//! A sequence of mappings gets one column per key, in order of first
//! appearance; rows missing a key show an empty cell. A sequence of scalars
//! is a single `value` column. Nested mappings and sequences inside a cell
//! are shown as compact JSON.
//!
//! Column widths are the longest cell or header, capped at 50 characters;
//! longer cells are truncated with "...".

use std::fmt::Write;

use crate::driver::RowSet;
use crate::types::{Datum, Value};

const MAX_COLUMN_WIDTH: usize = 50;
const BLOB_PREVIEW_BYTES: usize = 16;

pub struct TableFormatter {
    headers: Vec<String>,
    widths: Vec<usize>,
    rows: Vec<Vec<String>>,
}

impl TableFormatter {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut widths: Vec<usize> = headers.iter().map(|h| display_len(h).max(1)).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(display_len(cell)).min(MAX_COLUMN_WIDTH);
            }
        }

        Self {
            headers,
            widths,
            rows,
        }
    }

    pub fn from_row_set(set: &RowSet) -> Self {
        let rows = set
            .rows
            .iter()
            .map(|row| row.values.iter().map(format_value).collect())
            .collect();
        Self::new(set.columns.clone(), rows)
    }

    pub fn from_sequence(items: &[Datum]) -> Self {
        let mut headers: Vec<String> = Vec::new();
        for item in items {
            match item {
                Datum::Map(record) => {
                    for key in record.keys() {
                        if !headers.iter().any(|h| h == key) {
                            headers.push(key.to_string());
                        }
                    }
                }
                _ => {
                    if !headers.iter().any(|h| h == "value") {
                        headers.push("value".to_string());
                    }
                }
            }
        }

        let rows = items
            .iter()
            .map(|item| {
                headers
                    .iter()
                    .map(|header| match item {
                        Datum::Map(record) => record.get(header).map(format_datum).unwrap_or_default(),
                        other if header == "value" => format_datum(other),
                        _ => String::new(),
                    })
                    .collect()
            })
            .collect();

        Self::new(headers, rows)
    }

    pub fn render(&self) -> String {
        let mut output = String::new();

        self.write_separator(&mut output);
        self.write_row(&mut output, &self.headers);
        self.write_separator(&mut output);
        for row in &self.rows {
            self.write_row(&mut output, row);
        }
        self.write_separator(&mut output);

        output
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn write_separator(&self, output: &mut String) {
        output.push('+');
        for width in &self.widths {
            output.push_str(&"-".repeat(width + 2));
            output.push('+');
        }
        output.push('\n');
    }

    fn write_row(&self, output: &mut String, cells: &[String]) {
        output.push('|');
        for (i, width) in self.widths.iter().copied().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let _ = write!(output, " {:<width$} |", truncate(cell, width), width = width);
        }
        output.push('\n');
    }
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format_blob(b),
    }
}

fn format_datum(datum: &Datum) -> String {
    match datum {
        Datum::Scalar(value) => format_value(value),
        nested => nested.to_json().to_string(),
    }
}

fn format_float(f: f64) -> String {
    let text = format!("{:.6}", f);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn format_blob(bytes: &[u8]) -> String {
    let shown = &bytes[..bytes.len().min(BLOB_PREVIEW_BYTES)];
    let hex: String = shown.iter().map(|b| format!("{:02X}", b)).collect();
    if bytes.len() <= BLOB_PREVIEW_BYTES {
        format!("x'{}'", hex)
    } else {
        format!("x'{}'... ({} bytes)", hex, bytes.len())
    }
}

fn display_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate(s: &str, max_len: usize) -> String {
    if display_len(s) <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let mut result: String = s.chars().take(max_len - 3).collect();
        result.push_str("...");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Context;

    fn bug(id: i64, title: &str) -> Datum {
        Datum::Map(Context::new().with("bugid", id).with("title", title))
    }

    #[test]
    fn sequence_of_mappings_renders_columns() {
        let formatter = TableFormatter::from_sequence(&[bug(1, "crash"), bug(2, "hang")]);
        let output = formatter.render();

        assert!(output.contains("| bugid | title |"), "{output}");
        assert!(output.contains("| 1     | crash |"), "{output}");
        assert!(output.contains("| 2     | hang  |"), "{output}");
        assert_eq!(formatter.row_count(), 2);
    }

    #[test]
    fn missing_keys_leave_empty_cells() {
        let sparse = Datum::Map(Context::new().with("bugid", 3));
        let output = TableFormatter::from_sequence(&[bug(1, "crash"), sparse]).render();
        assert!(output.contains("| 3     |       |"), "{output}");
    }

    #[test]
    fn scalar_sequence_is_one_value_column() {
        let items = vec![Datum::from(1), Datum::from("two"), Datum::Scalar(Value::Null)];
        let output = TableFormatter::from_sequence(&items).render();

        assert!(output.contains("| value |"));
        assert!(output.contains("| two   |"));
        assert!(output.contains("| NULL  |"));
    }

    #[test]
    fn row_set_renders_headers_even_when_empty() {
        let set = RowSet::new(vec!["id".into(), "name".into()]);
        let formatter = TableFormatter::from_row_set(&set);
        let output = formatter.render();

        assert!(output.contains("+----+------+"));
        assert!(output.contains("| id | name |"));
        assert_eq!(formatter.row_count(), 0);
    }

    #[test]
    fn float_values_format_without_trailing_zeros() {
        assert_eq!(format_value(&Value::Float(3.5)), "3.5");
        assert_eq!(format_value(&Value::Float(3.0)), "3");
        assert_eq!(format_value(&Value::Float(1.23456)), "1.23456");
    }

    #[test]
    fn blobs_display_as_hex() {
        assert_eq!(format_value(&Value::Blob(vec![0xDE, 0xAD, 0xBE, 0xEF])), "x'DEADBEEF'");

        let long: Vec<u8> = (0..32).collect();
        let formatted = format_value(&Value::Blob(long));
        assert!(formatted.starts_with("x'"));
        assert!(formatted.ends_with("... (32 bytes)"));
    }

    #[test]
    fn long_text_is_truncated_at_max_width() {
        let truncated = truncate("This is a very long string that exceeds the maximum width", 20);
        assert_eq!(truncated.len(), 20);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate("Short", 20), "Short");
    }

    #[test]
    fn nested_cells_render_as_json() {
        let owner = Datum::Map(Context::new().with("name", "ann"));
        let row = Datum::Map(Context::new().with("owner", owner));
        let output = TableFormatter::from_sequence(&[row]).render();
        assert!(output.contains(r#"{"name":"ann"}"#), "{output}");
    }
}
