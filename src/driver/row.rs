use crate::types::Value;
use eyre::{bail, Result};

/// One fetched row, positionally aligned with [`RowSet::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_int(&self, index: usize) -> Result<i64> {
        match self.get(index) {
            Some(Value::Int(i)) => Ok(*i),
            Some(other) => bail!("expected INT, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn get_text(&self, index: usize) -> Result<&str> {
        match self.get(index) {
            Some(Value::Text(s)) => Ok(s),
            Some(other) => bail!("expected TEXT, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Value::Null))
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }
}

/// Materialized result of a query: column labels plus rows in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, values: Vec<Value>) {
        self.rows.push(Row::new(values));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let row = Row::new(vec![Value::Int(5), Value::Text("x".into()), Value::Null]);
        assert_eq!(row.get_int(0).unwrap(), 5);
        assert_eq!(row.get_text(1).unwrap(), "x");
        assert!(row.is_null(2));
        assert_eq!(row.column_count(), 3);
        assert!(row.get_int(1).is_err());
        assert!(row.get_int(9).is_err());
    }

    #[test]
    fn column_lookup() {
        let mut set = RowSet::new(vec!["bugid".into(), "title".into()]);
        set.push(vec![Value::Int(1), Value::Text("a".into())]);
        assert_eq!(set.column_index("title"), Some(1));
        assert_eq!(set.len(), 1);
    }
}
