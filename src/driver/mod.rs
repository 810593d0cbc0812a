//! # Connection Abstraction
//!
//! The execution engine talks to a database only through the [`Connection`]
//! trait. It needs six things from a driver: a positional marker syntax,
//! statement preparation, execution with positional values, row fetching,
//! and the two transaction verbs.
//!
//! ## Transaction Protocol
//!
//! ```text
//! ┌──────────┐ first statement ┌──────────┐  commit / rollback  ┌──────────┐
//! │  connect │ ──────────────► │  in txn  │ ──────────────────► │   idle   │
//! └──────────┘   (implicit     └──────────┘                     └──────────┘
//!                 BEGIN)             ▲        next statement         │
//!                                    └───────────────────────────────┘
//! ```
//!
//! There are no savepoints and no nested transactions. `commit` and
//! `rollback` outside a transaction succeed without doing anything.
//!
//! ## Errors
//!
//! Driver methods return `eyre::Result`. The execution engine wraps every
//! report with the SQL text that produced it before surfacing it as
//! `LibrarianError::Driver`.
//!
//! ## Implementations
//!
//! - [`SqliteConnection`]: rusqlite-backed, `?` markers, statement cache

mod row;
mod sqlite;

pub use row::{Row, RowSet};
pub use sqlite::SqliteConnection;

use eyre::Result;

use crate::types::Value;

pub trait Connection {
    /// Marker for the `index`-th (1-based) bound parameter.
    fn positional_marker(&self, _index: usize) -> String {
        "?".to_string()
    }

    /// Prepares `sql`, surfacing syntax and schema errors.
    fn prepare(&mut self, sql: &str) -> Result<()>;

    /// Runs a statement that returns no rows and reports the affected count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Runs a statement and fetches at most `limit` rows (all when `None`).
    fn query(&mut self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<RowSet>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Whether a transaction is open.
    fn in_transaction(&self) -> bool;

    /// Releases the underlying handle. Any open transaction is rolled back.
    fn disconnect(&mut self) -> Result<()>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn positional_marker(&self, index: usize) -> String {
        (**self).positional_marker(index)
    }

    fn prepare(&mut self, sql: &str) -> Result<()> {
        (**self).prepare(sql)
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        (**self).execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<RowSet> {
        (**self).query(sql, params, limit)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }

    fn disconnect(&mut self) -> Result<()> {
        (**self).disconnect()
    }
}
