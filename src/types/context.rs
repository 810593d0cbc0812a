//! # Data Context
//!
//! The context is the single channel between an application and its SQL
//! templates. Bind variables and direct substitutions read from it; SELECT
//! statements write their rows back into it.
//!
//! ## Shape
//!
//! ```text
//! Context ── key ──> Datum
//!                      ├── Scalar(Value)
//!                      ├── Map(Context)
//!                      └── Seq(Vec<Datum>)
//! ```
//!
//! Keys are kept in sorted order so rendering a context is deterministic.
//!
//! ## Paths
//!
//! Placeholders may name nested values with dotted paths: `:order.id` reads
//! the scalar `id` inside the mapping stored at `order`. Every step is
//! checked; a sequence where a mapping was expected, or a mapping where a
//! scalar was expected, raises `ShapeMismatch` instead of coercing.
//!
//! ## First-of-Sequence Mode
//!
//! With `first_of_seq` set (the `all_arrays` option), every top-level key is
//! expected to hold a sequence and index 0 of that sequence is used in its
//! place, both when reading and when a single-row SELECT writes a value.
//! One context layout then serves single-row and batch call sites alike:
//!
//! ```text
//! first_of_seq = false        first_of_seq = true
//! { id: 5 }                   { id: [5] }
//! { bug: { id: 5 } }          { bug: [ { id: 5 } ] }
//! ```

use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use super::Value;
use crate::error::{LibrarianError, Result};

/// Structural category of a [`Datum`], used in mismatch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Mapping,
    Sequence,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Scalar => "scalar",
            Shape::Mapping => "mapping",
            Shape::Sequence => "sequence",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Scalar(Value),
    Map(Context),
    Seq(Vec<Datum>),
}

impl Datum {
    pub fn shape(&self) -> Shape {
        match self {
            Datum::Scalar(_) => Shape::Scalar,
            Datum::Map(_) => Shape::Mapping,
            Datum::Seq(_) => Shape::Sequence,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Datum::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Context> {
        match self {
            Datum::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Datum]> {
        match self {
            Datum::Seq(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! datum_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Datum {
                fn from(v: $ty) -> Self {
                    Datum::Scalar(Value::from(v))
                }
            }
        )*
    };
}

datum_from_scalar!(bool, i32, i64, u32, f64, &str, String, Vec<u8>);

impl From<Value> for Datum {
    fn from(v: Value) -> Self {
        Datum::Scalar(v)
    }
}

impl From<Context> for Datum {
    fn from(m: Context) -> Self {
        Datum::Map(m)
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(items: Vec<Datum>) -> Self {
        Datum::Seq(items)
    }
}

impl From<Vec<Context>> for Datum {
    fn from(rows: Vec<Context>) -> Self {
        Datum::Seq(rows.into_iter().map(Datum::Map).collect())
    }
}

/// Mutable, nested mapping from keys to [`Datum`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: BTreeMap<String, Datum>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Datum> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Datum> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Datum>) -> Option<Datum> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Datum> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Datum> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Scalar stored directly at `key`.
    pub fn scalar(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(Datum::as_scalar)
    }

    pub fn map(&self, key: &str) -> Option<&Context> {
        self.get(key).and_then(Datum::as_map)
    }

    pub fn sequence(&self, key: &str) -> Option<&[Datum]> {
        self.get(key).and_then(Datum::as_seq)
    }

    /// Resolves a (possibly dotted) placeholder name to a scalar.
    pub fn resolve(&self, path: &str, first_of_seq: bool) -> Result<&Value> {
        let mut segments = path.split('.');
        let head = segments.next().unwrap_or(path);

        let mut datum = self.get(head).ok_or_else(|| missing(path))?;
        if first_of_seq {
            datum = match datum {
                Datum::Seq(items) => items.first().ok_or_else(|| missing(path))?,
                other => return Err(mismatch(head, Shape::Sequence, other.shape())),
            };
        }

        for segment in segments {
            datum = match datum {
                Datum::Map(inner) => inner.get(segment).ok_or_else(|| missing(path))?,
                other => return Err(mismatch(path, Shape::Mapping, other.shape())),
            };
        }

        match datum {
            Datum::Scalar(v) => Ok(v),
            other => Err(mismatch(path, Shape::Scalar, other.shape())),
        }
    }

    /// Writes a single-row column value at `key`.
    pub fn assign(&mut self, key: &str, value: Value, first_of_seq: bool) -> Result<()> {
        if first_of_seq {
            let slot = self.first_slot(key, || Datum::Scalar(Value::Null))?;
            return match slot {
                Datum::Scalar(existing) => {
                    *existing = value;
                    Ok(())
                }
                other => Err(mismatch(key, Shape::Scalar, other.shape())),
            };
        }

        match self.entries.get_mut(key) {
            None => {
                self.entries.insert(key.to_string(), Datum::Scalar(value));
                Ok(())
            }
            Some(Datum::Scalar(existing)) => {
                *existing = value;
                Ok(())
            }
            Some(other) => Err(mismatch(key, Shape::Scalar, other.shape())),
        }
    }

    /// Writes a single-row column value at `group.field`.
    pub fn assign_nested(
        &mut self,
        group: &str,
        field: &str,
        value: Value,
        first_of_seq: bool,
    ) -> Result<()> {
        let target = if first_of_seq {
            self.first_slot(group, || Datum::Map(Context::new()))?
        } else {
            self.entries
                .entry(group.to_string())
                .or_insert_with(|| Datum::Map(Context::new()))
        };

        match target {
            Datum::Map(inner) => inner.assign(field, value, false).map_err(|err| match err {
                LibrarianError::ShapeMismatch {
                    expected, found, ..
                } => mismatch(&format!("{}.{}", group, field), expected, found),
                other => other,
            }),
            other => Err(mismatch(group, Shape::Mapping, other.shape())),
        }
    }

    /// Replaces the sequence at `key` with an empty one.
    ///
    /// Fails when `key` holds a scalar or a mapping: a multi-row result never
    /// overwrites a value of a different shape.
    pub fn reset_sequence(&mut self, key: &str) -> Result<()> {
        match self.entries.get_mut(key) {
            None => {
                self.entries.insert(key.to_string(), Datum::Seq(Vec::new()));
                Ok(())
            }
            Some(Datum::Seq(items)) => {
                items.clear();
                Ok(())
            }
            Some(other) => Err(mismatch(key, Shape::Sequence, other.shape())),
        }
    }

    /// Appends to the sequence at `key`, creating it when absent.
    pub fn push(&mut self, key: &str, item: Datum) -> Result<()> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Datum::Seq(Vec::new()))
        {
            Datum::Seq(items) => {
                items.push(item);
                Ok(())
            }
            other => Err(mismatch(key, Shape::Sequence, other.shape())),
        }
    }

    fn first_slot(&mut self, key: &str, init: impl FnOnce() -> Datum) -> Result<&mut Datum> {
        let datum = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Datum::Seq(Vec::new()));

        match datum {
            Datum::Seq(items) => {
                if items.is_empty() {
                    items.push(init());
                }
                Ok(&mut items[0])
            }
            other => Err(mismatch(key, Shape::Sequence, other.shape())),
        }
    }
}

impl<'a> IntoIterator for &'a Context {
    type Item = (&'a String, &'a Datum);
    type IntoIter = btree_map::Iter<'a, String, Datum>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, V: Into<Datum>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

fn missing(key: &str) -> LibrarianError {
    LibrarianError::MissingKey {
        key: key.to_string(),
    }
}

fn mismatch(key: &str, expected: Shape, found: Shape) -> LibrarianError {
    LibrarianError::ShapeMismatch {
        key: key.to_string(),
        expected,
        found,
    }
}
