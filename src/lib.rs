//! # Librarian - SQL Template Repository and Runtime
//!
//! Librarian keeps SQL out of application code. Statements live in a
//! repository of named, parameterized templates ("tags") and run through a
//! thin transactional runtime. Data goes in and comes out through one nested
//! mapping, the [`Context`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use librarian::{Context, FileArchiver, Librarian, SqliteConnection};
//!
//! // sql/t_insert.sql:
//! //   INSERT INTO bug (bugid, title) VALUES (:bugid, :title);
//! //
//! //   SELECT1 bugid FROM bug WHERE title = :title;
//! let mut librarian = Librarian::builder()
//!     .archiver(FileArchiver::new("./sql"))
//!     .connection(SqliteConnection::open("bugs.db")?)
//!     .build()?;
//!
//! let mut ctx = Context::new().with("bugid", 5).with("title", "crash");
//! let affected = librarian.execute("t_insert", &mut ctx)?;
//! assert_eq!(affected, 1);
//! ```
//!
//! ## Template Syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `:name`, `:rec.field` | bind variable, resolved from the context per execution |
//! | `$name` | direct substitution, pasted into the SQL text before preparing |
//! | `SELECT` / `SELECT*` | all rows, written as sequences |
//! | `SELECT?` | zero or one row, merged flat |
//! | `SELECT1` | exactly one row, merged flat |
//! | blank line | statement separator inside one tag |
//! | `include other_tag` | run another tag's chain in place |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │       Librarian (execution coordinator)     │
//! ├──────────────────────┬──────────────────────┤
//! │  Statement chains    │  Archiver + cache    │
//! ├──────────────────────┤  (file, block, mem)  │
//! │  Compiled statements ├──────────────────────┤
//! ├──────────────────────┤  Connection          │
//! │  Placeholder parser  │  (SQLite)            │
//! │  Select classifier   │                      │
//! └──────────────────────┴──────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`parsing`]: placeholder scanner and select classifier
//! - [`statement`]: compiled statements and row fetch contracts
//! - [`chain`]: block splitting and include references
//! - [`librarian`]: execution coordinator, sessions, shared handle
//! - [`archive`]: template sources and the compiled chain cache
//! - [`driver`]: connection trait and the SQLite implementation
//! - [`types`]: scalar values and the nested context
//! - [`error`]: error type and categories
//! - [`config`]: shared constants
//! - `cli`: interactive shell (feature `cli`)

pub mod archive;
pub mod chain;
pub mod config;
pub mod driver;
pub mod error;
pub mod librarian;
pub mod parsing;
pub mod statement;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use archive::{Archiver, BlockArchiver, FileArchiver, MemoryArchiver};
pub use chain::{ChainEntry, StatementChain};
pub use driver::{Connection, Row, RowSet, SqliteConnection};
pub use error::{ErrorKind, LibrarianError, Result};
pub use librarian::{Librarian, LibrarianBuilder, LibrarianConfig, SharedLibrarian, Stage};
pub use parsing::{SelectMode, StatementKind};
pub use statement::CompiledStatement;
pub use types::{Context, Datum, Shape, Value};
