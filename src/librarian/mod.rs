//! # Execution Coordinator
//!
//! [`Librarian`] ties an [`Archiver`] to one [`Connection`] and runs tags.
//!
//! ## Execute
//!
//! ```text
//! execute(tag, ctx)
//!   │
//!   ├─ lookup(tag) ── hit ──────────────────────────┐
//!   │      │ miss                                   │
//!   │      ▼                                        │
//!   │   Compiling: find, compile, compile includes, │
//!   │              cache                            │
//!   │                                               ▼
//!   ├─ Running: walk the chain; includes recurse on the same
//!   │           context and session; totals accumulate
//!   │
//!   ├─ error ──► rollback ──► RolledBack, error returned
//!   │
//!   └─ ok ──► total > 0 and auto-commit ──► commit ──► Committed
//!              otherwise                             ► Completed
//! ```
//!
//! Errors raised while compiling do not roll back: nothing ran yet, and the
//! transaction may hold work from earlier calls made with auto-commit off.
//!
//! ## Includes and Cycles
//!
//! Includes are compiled eagerly, depth first, before the including chain is
//! cached. A tag met again on the compile stack is an `IncludeCycle`. Chains
//! can also be cached independently and later edited into a cycle, so the
//! running walk checks the session stack as well, and both walks stop at the
//! configured include depth.
//!
//! ## Transactions
//!
//! The connection keeps a transaction open at all times. With auto-commit on
//! (the default), every call that changed rows commits. With auto-commit off,
//! several calls share one transaction until [`Librarian::commit`] or
//! [`Librarian::rollback`].

mod builder;
mod config;
mod session;
mod shared;

pub use builder::LibrarianBuilder;
pub use config::LibrarianConfig;
pub use session::{ExecutionSession, Stage};
pub use shared::SharedLibrarian;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::archive::Archiver;
use crate::chain::{ChainEntry, StatementChain};
use crate::driver::Connection;
use crate::error::{LibrarianError, Result};
use crate::types::Context;

pub struct Librarian<A, C> {
    archiver: A,
    connection: Option<C>,
    config: LibrarianConfig,
    last_stage: Stage,
}

impl<A: Archiver, C: Connection> Librarian<A, C> {
    pub fn new(archiver: A, connection: C) -> Self {
        Self::with_config(archiver, connection, LibrarianConfig::default())
    }

    pub fn with_config(archiver: A, connection: C, config: LibrarianConfig) -> Self {
        Self {
            archiver,
            connection: Some(connection),
            config,
            last_stage: Stage::Idle,
        }
    }

    pub fn builder() -> LibrarianBuilder<A, C> {
        LibrarianBuilder::new()
    }

    /// Runs the chain of `tag` against `ctx` and returns the number of rows
    /// changed by its mutations, includes counted.
    pub fn execute(&mut self, tag: &str, ctx: &mut Context) -> Result<usize> {
        let mut session = ExecutionSession::new(self.config.include_depth_limit());
        let result = self.execute_session(tag, ctx, &mut session);
        self.last_stage = session.stage();
        result
    }

    fn execute_session(
        &mut self,
        tag: &str,
        ctx: &mut Context,
        session: &mut ExecutionSession,
    ) -> Result<usize> {
        let Self {
            archiver,
            connection,
            config,
            ..
        } = self;
        let conn = connection.as_mut().ok_or(LibrarianError::NotConnected)?;

        let chain = match archiver.lookup(tag) {
            Some(chain) => {
                debug!(tag, "chain cache hit");
                chain
            }
            None => {
                session.advance(Stage::Compiling);
                compile_chain(archiver, conn, config, tag, &mut Vec::new())?
            }
        };

        session.advance(Stage::Running);
        if let Err(err) = run_chain(archiver, conn, config, &chain, ctx, session) {
            roll_back_after(conn, &err);
            session.advance(Stage::RolledBack);
            return Err(err);
        }

        let affected = session.affected();
        if affected > 0 && config.auto_commit {
            if let Err(report) = conn.commit() {
                let err = LibrarianError::driver("COMMIT", report);
                roll_back_after(conn, &err);
                session.advance(Stage::RolledBack);
                return Err(err);
            }
            debug!(tag, affected, "committed");
            session.advance(Stage::Committed);
        } else {
            session.advance(Stage::Completed);
        }

        Ok(affected)
    }

    /// Compiles and caches each tag that has no valid cached chain.
    ///
    /// Stops at the first tag that fails to compile.
    pub fn prepare<I>(&mut self, tags: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let Self {
            archiver,
            connection,
            config,
            ..
        } = self;
        let conn = connection.as_mut().ok_or(LibrarianError::NotConnected)?;

        for tag in tags {
            obtain_chain(archiver, conn, config, tag.as_ref())?;
        }
        Ok(())
    }

    /// Prepares every tag in the table of contents and returns how many.
    pub fn prepare_all(&mut self) -> Result<usize> {
        let tags = self.toc()?;
        self.prepare(&tags)?;
        Ok(tags.len())
    }

    pub fn toc(&mut self) -> Result<BTreeSet<String>> {
        self.archiver.toc()
    }

    pub fn commit(&mut self) -> Result<()> {
        let conn = self.connection_mut()?;
        conn.commit()
            .map_err(|e| LibrarianError::driver("COMMIT", e))?;
        debug!("committed");
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        let conn = self.connection_mut()?;
        conn.rollback()
            .map_err(|e| LibrarianError::driver("ROLLBACK", e))?;
        debug!("rolled back");
        Ok(())
    }

    pub fn set_auto_commit(&mut self, enabled: bool) {
        self.config.auto_commit = enabled;
    }

    pub fn auto_commit(&self) -> bool {
        self.config.auto_commit
    }

    /// Rolls back any open transaction, releases the connection and drops
    /// every cached chain. Later calls fail with `NotConnected`.
    pub fn disconnect(&mut self) -> Result<()> {
        self.archiver.clear();
        let Some(mut conn) = self.connection.take() else {
            return Ok(());
        };
        conn.disconnect()
            .map_err(|e| LibrarianError::driver("DISCONNECT", e))?;
        debug!("disconnected");
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn config(&self) -> &LibrarianConfig {
        &self.config
    }

    /// Stage the most recent `execute` call ended in.
    pub fn last_stage(&self) -> Stage {
        self.last_stage
    }

    pub fn archiver(&self) -> &A {
        &self.archiver
    }

    pub fn archiver_mut(&mut self) -> &mut A {
        &mut self.archiver
    }

    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> Result<&mut C> {
        self.connection.as_mut().ok_or(LibrarianError::NotConnected)
    }
}

/// Cached chain of `tag`, compiling it on a miss.
fn obtain_chain<A, C>(
    archiver: &mut A,
    conn: &mut C,
    config: &LibrarianConfig,
    tag: &str,
) -> Result<Arc<StatementChain>>
where
    A: Archiver,
    C: Connection,
{
    match archiver.lookup(tag) {
        Some(chain) => Ok(chain),
        None => compile_chain(archiver, conn, config, tag, &mut Vec::new()),
    }
}

fn compile_chain<A, C>(
    archiver: &mut A,
    conn: &mut C,
    config: &LibrarianConfig,
    tag: &str,
    stack: &mut Vec<String>,
) -> Result<Arc<StatementChain>>
where
    A: Archiver,
    C: Connection,
{
    if stack.iter().any(|t| t == tag) {
        let mut path = stack.clone();
        path.push(tag.to_string());
        return Err(LibrarianError::IncludeCycle { path });
    }
    let limit = config.include_depth_limit();
    if stack.len() >= limit {
        return Err(LibrarianError::IncludeDepth {
            tag: tag.to_string(),
            limit,
        });
    }

    let body = archiver.find(tag)?;
    let chain = StatementChain::compile(tag, &body, conn, config.prepare_on_compile)?;

    stack.push(tag.to_string());
    for included in chain.includes() {
        if archiver.lookup(included).is_none() {
            compile_chain(archiver, conn, config, included, stack)?;
        }
    }
    stack.pop();

    debug!(tag, entries = chain.len(), "compiled and cached chain");
    let chain = Arc::new(chain);
    archiver.cache(tag, Arc::clone(&chain));
    Ok(chain)
}

fn run_chain<A, C>(
    archiver: &mut A,
    conn: &mut C,
    config: &LibrarianConfig,
    chain: &StatementChain,
    ctx: &mut Context,
    session: &mut ExecutionSession,
) -> Result<()>
where
    A: Archiver,
    C: Connection,
{
    session.enter(chain.tag())?;

    for entry in chain.entries() {
        match entry {
            ChainEntry::Statement(stmt) => {
                let affected = stmt.execute(conn, ctx, config.all_arrays)?;
                session.add_affected(affected);
            }
            ChainEntry::Include(tag) => {
                let included = obtain_chain(archiver, conn, config, tag)?;
                run_chain(archiver, conn, config, &included, ctx, session)?;
            }
        }
    }

    session.leave();
    Ok(())
}

fn roll_back_after<C: Connection>(conn: &mut C, cause: &LibrarianError) {
    match conn.rollback() {
        Ok(()) => debug!(error = %cause, "rolled back after failure"),
        Err(report) => warn!(error = %cause, rollback = %report, "rollback after failure also failed"),
    }
}
