use std::borrow::Cow;

use smallvec::SmallVec;
use tracing::trace;

use super::fetch::FetchOptions;
use crate::driver::Connection;
use crate::error::{LibrarianError, Result};
use crate::parsing::{classify, parse_placeholders, substitute, StatementKind};
use crate::types::{Context, Value};

/// One normalized template statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    kind: StatementKind,
    sql: String,
    binds: SmallVec<[String; 4]>,
    substitutions: SmallVec<[String; 2]>,
}

impl CompiledStatement {
    /// Classifies and normalizes `text` for `conn`'s marker syntax.
    ///
    /// With `prepare` set, statements without substitutions are prepared
    /// right away so driver errors surface at compile time.
    pub fn compile<C>(text: &str, conn: &mut C, prepare: bool) -> Result<Self>
    where
        C: Connection + ?Sized,
    {
        let classified = classify(text)?;
        let parsed = parse_placeholders(&classified.sql, |n| conn.positional_marker(n));

        let stmt = Self {
            kind: classified.kind,
            sql: parsed.sql,
            binds: parsed.binds,
            substitutions: parsed.substitutions,
        };

        if prepare && !stmt.needs_substitution() {
            conn.prepare(&stmt.sql)
                .map_err(|e| LibrarianError::driver(&stmt.sql, e))?;
        }

        Ok(stmt)
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Normalized SQL; substitution markers are still in place.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bind_names(&self) -> &[String] {
        &self.binds
    }

    pub fn substitution_names(&self) -> &[String] {
        &self.substitutions
    }

    pub fn needs_substitution(&self) -> bool {
        !self.substitutions.is_empty()
    }

    /// Builds the text that will actually be prepared for `ctx`.
    pub fn render(&self, ctx: &Context, first_of_seq: bool) -> Result<Cow<'_, str>> {
        if !self.needs_substitution() {
            return Ok(Cow::Borrowed(&self.sql));
        }
        let text = substitute(&self.sql, |name| {
            Ok(ctx.resolve(name, first_of_seq)?.sql_text())
        })?;
        Ok(Cow::Owned(text))
    }

    /// Bind values in marker order.
    pub fn bind_values(&self, ctx: &Context, first_of_seq: bool) -> Result<SmallVec<[Value; 4]>> {
        self.binds
            .iter()
            .map(|name| ctx.resolve(name, first_of_seq).cloned())
            .collect()
    }

    /// Runs the statement and returns the rows it affected.
    ///
    /// Selects write into `ctx` and always report 0.
    pub fn execute<C>(&self, conn: &mut C, ctx: &mut Context, first_of_seq: bool) -> Result<usize>
    where
        C: Connection + ?Sized,
    {
        let sql = self.render(ctx, first_of_seq)?;
        if self.needs_substitution() {
            conn.prepare(&sql)
                .map_err(|e| LibrarianError::driver(&sql, e))?;
        }

        let params = self.bind_values(ctx, first_of_seq)?;
        trace!(sql = %sql, binds = params.len(), "executing statement");

        match self.kind {
            StatementKind::Mutation => conn
                .execute(&sql, &params)
                .map_err(|e| LibrarianError::driver(&sql, e)),
            StatementKind::Select(mode) => {
                let rows = conn
                    .query(&sql, &params, mode.row_limit())
                    .map_err(|e| LibrarianError::driver(&sql, e))?;
                let opts = FetchOptions {
                    first_of_seq,
                    sql: &sql,
                };
                (mode.fetcher())(&rows, ctx, &opts)?;
                Ok(0)
            }
        }
    }
}
