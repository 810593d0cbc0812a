//! # SQLite Connection
//!
//! [`Connection`] implementation on top of `rusqlite`.
//!
//! ## Statement Preparation
//!
//! Every statement goes through `prepare_cached`, so a compiled statement
//! only has to remember its SQL text: the prepared handle lives in the
//! rusqlite statement cache and is reused on every execution. Statements
//! whose text changes per call (direct substitutions) simply miss the cache.
//!
//! ## Transactions
//!
//! SQLite runs in autocommit mode until `BEGIN`. The connection issues
//! `BEGIN` lazily before the first statement that follows a connect, commit,
//! or rollback, which gives the "always inside a transaction" protocol the
//! execution engine expects.
//!
//! ## Value Mapping
//!
//! | Value | SQLite |
//! |-------|--------|
//! | Null | NULL |
//! | Bool | INTEGER 0/1 |
//! | Int | INTEGER |
//! | Float | REAL |
//! | Text | TEXT |
//! | Blob | BLOB |
//!
//! Fetched TEXT that is not valid UTF-8 is decoded lossily.

use std::path::Path;

use eyre::{eyre, Result, WrapErr};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::params_from_iter;
use tracing::{debug, warn};

use super::{Connection, RowSet};
use crate::config::SQLITE_STATEMENT_CACHE_CAPACITY;
use crate::types::Value;

pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = rusqlite::Connection::open(path)
            .wrap_err_with(|| format!("failed to open SQLite database at {:?}", path))?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()
            .wrap_err("failed to open in-memory SQLite database")?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        conn.set_prepared_statement_cache_capacity(SQLITE_STATEMENT_CACHE_CAPACITY);
        Self { conn: Some(conn) }
    }

    /// Runs setup SQL directly, outside the template machinery.
    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.handle()?.execute_batch(sql)?;
        Ok(())
    }

    /// Underlying rusqlite handle, if still connected.
    pub fn raw(&self) -> Option<&rusqlite::Connection> {
        self.conn.as_ref()
    }

    fn handle(&self) -> Result<&rusqlite::Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| eyre!("SQLite connection is closed"))
    }

    fn begin_if_idle(&self) -> Result<&rusqlite::Connection> {
        let conn = self.handle()?;
        if conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }
        Ok(conn)
    }
}

impl Connection for SqliteConnection {
    fn prepare(&mut self, sql: &str) -> Result<()> {
        self.handle()?.prepare_cached(sql)?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.begin_if_idle()?;
        let mut stmt = conn.prepare_cached(sql)?;
        if stmt.column_count() == 0 {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            return Ok(affected);
        }

        // Row-returning statements (RETURNING, WITH ... SELECT, PRAGMA) run to
        // completion with their rows discarded.
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while rows.next()?.is_some() {}
        drop(rows);

        if stmt.readonly() {
            return Ok(0);
        }
        Ok(conn.changes() as usize)
    }

    fn query(&mut self, sql: &str, params: &[Value], limit: Option<usize>) -> Result<RowSet> {
        let conn = self.begin_if_idle()?;
        let mut stmt = conn.prepare_cached(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();
        let mut set = RowSet::new(columns);

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while limit.map_or(true, |max| set.len() < max) {
            let Some(row) = rows.next()? else {
                break;
            };
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i)?));
            }
            set.push(values);
        }

        Ok(set)
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.handle()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let conn = self.handle()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| !c.is_autocommit())
    }

    fn disconnect(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        if !conn.is_autocommit() {
            warn!("disconnecting with an open transaction, rolling back");
            conn.execute_batch("ROLLBACK")?;
        }

        conn.close().map_err(|(_, err)| eyre!(err))?;
        debug!("SQLite connection closed");
        Ok(())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::Int(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Int(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug_db() -> SqliteConnection {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE bug (bugid INTEGER, title TEXT)")
            .unwrap();
        conn
    }

    #[test]
    fn execute_reports_affected_rows() {
        let mut conn = bug_db();
        let n = conn
            .execute(
                "INSERT INTO bug VALUES (?, ?)",
                &[Value::Int(1), Value::Text("a".into())],
            )
            .unwrap();
        assert_eq!(n, 1);
        assert!(conn.in_transaction());
    }

    #[test]
    fn execute_runs_row_returning_statements() {
        let mut conn = bug_db();
        conn.execute("INSERT INTO bug VALUES (1, 'a')", &[]).unwrap();

        let n = conn
            .execute("WITH x AS (SELECT 1 AS n) SELECT n FROM x", &[])
            .unwrap();
        assert_eq!(n, 0);

        let n = conn
            .execute(
                "INSERT INTO bug VALUES (?, 'b') RETURNING bugid",
                &[Value::Int(2)],
            )
            .unwrap();
        assert_eq!(n, 1);

        let rows = conn.query("SELECT bugid FROM bug", &[], None).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn query_respects_limit() {
        let mut conn = bug_db();
        for i in 0..5 {
            conn.execute("INSERT INTO bug VALUES (?, 'x')", &[Value::Int(i)])
                .unwrap();
        }

        let all = conn.query("SELECT bugid FROM bug", &[], None).unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all.columns, vec!["bugid".to_string()]);

        let two = conn.query("SELECT bugid FROM bug", &[], Some(2)).unwrap();
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn commit_and_rollback_close_the_transaction() {
        let mut conn = bug_db();
        conn.execute("INSERT INTO bug VALUES (1, 'a')", &[]).unwrap();
        conn.rollback().unwrap();
        assert!(!conn.in_transaction());

        let rows = conn.query("SELECT bugid FROM bug", &[], None).unwrap();
        assert!(rows.is_empty());

        conn.commit().unwrap();
        assert!(!conn.in_transaction());
    }

    #[test]
    fn prepare_surfaces_bad_sql() {
        let mut conn = bug_db();
        assert!(conn.prepare("SELEC bugid FROM bug").is_err());
        assert!(conn.prepare("SELECT bugid FROM nope").is_err());
        assert!(conn.prepare("SELECT bugid FROM bug").is_ok());
    }

    #[test]
    fn values_round_trip_through_sqlite() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        let rows = conn
            .query(
                "SELECT ?, ?, ?, ?",
                &[
                    Value::Int(7),
                    Value::Float(1.5),
                    Value::Bool(true),
                    Value::Blob(vec![1, 2]),
                ],
                None,
            )
            .unwrap();
        assert_eq!(
            rows.rows[0].values,
            vec![
                Value::Int(7),
                Value::Float(1.5),
                Value::Int(1),
                Value::Blob(vec![1, 2])
            ]
        );
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut conn = bug_db();
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert!(conn.prepare("SELECT 1").is_err());
    }
}
