//! # Scalar Values
//!
//! `Value` is the fully-owned scalar stored at the leaves of a [`Context`]
//! and exchanged with the driver, both as bind parameters and as fetched
//! column values.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Bound as | Substituted as |
//! |---------|-----------|----------|----------------|
//! | Null | - | NULL | `NULL` |
//! | Bool | bool | integer 0/1 | `TRUE` / `FALSE` |
//! | Int | i64 | integer | decimal digits |
//! | Float | f64 | real | shortest round-trip form |
//! | Text | String | text | the raw text, unquoted |
//! | Blob | Vec<u8> | blob | `X'..'` hex literal |
//!
//! ## Substitution Text
//!
//! A direct substitution injects [`Value::sql_text`] into the statement before
//! it is prepared. Text is injected verbatim: `$columns` with the value
//! `"id, name"` becomes a column list, not a string literal. Quoting, when it
//! is wanted, is the template author's job.
//!
//! [`Context`]: super::Context

use std::fmt;

/// Fully-owned SQL scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Text spliced into a statement by a direct substitution.
    pub fn sql_text(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02X}", byte)).collect();
                format!("X'{}'", hex)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => write!(f, "<blob: {} bytes>", b.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Blob(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_substituted_verbatim() {
        assert_eq!(Value::from("id, name").sql_text(), "id, name");
    }

    #[test]
    fn blob_is_substituted_as_hex_literal() {
        let blob = Value::Blob(vec![0x48, 0x49]);
        assert_eq!(blob.as_blob(), Some(&[0x48, 0x49][..]));
        assert_eq!(blob.sql_text(), "X'4849'");
    }

    #[test]
    fn option_none_becomes_null() {
        let v: Value = Option::<i64>::None.into();
        assert!(v.is_null());
        assert_eq!(v.sql_text(), "NULL");
    }

    #[test]
    fn int_widens_to_float() {
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Text("3".into()).as_int(), None);
    }
}
