//! # Librarian Errors
//!
//! Every failure surfaced by the compiler and the execution coordinator is a
//! [`LibrarianError`]. Variants are grouped into the categories reported by
//! [`LibrarianError::kind`]:
//!
//! | Kind             | Raised when                                              |
//! |------------------|----------------------------------------------------------|
//! | `Compile`        | tag missing, unknown select mode, bad include, cycles    |
//! | `BindResolution` | a context key is missing or has the wrong shape          |
//! | `Driver`         | the connection rejects a prepare or an execute           |
//! | `Cardinality`    | a single-row select saw zero or too many rows            |
//! | `Connection`     | the librarian was already disconnected                   |
//! | `Archive`        | template sources could not be read                       |
//!
//! Driver errors carry the SQL text that failed so the offending statement can
//! be found without enabling trace output.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Shape;

pub type Result<T, E = LibrarianError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compile,
    BindResolution,
    Driver,
    Cardinality,
    Connection,
    Archive,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Compile => "compile",
            ErrorKind::BindResolution => "bind resolution",
            ErrorKind::Driver => "driver",
            ErrorKind::Cardinality => "cardinality",
            ErrorKind::Connection => "connection",
            ErrorKind::Archive => "archive",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum LibrarianError {
    #[error("tag '{tag}' not found")]
    TagNotFound { tag: String },

    #[error("invalid tag name '{tag}'")]
    InvalidTag { tag: String },

    #[error("unrecognized select mode 'select{suffix}' in: {sql}")]
    UnknownSelectMode { suffix: String, sql: String },

    #[error("malformed include directive: '{directive}'")]
    MalformedInclude { directive: String },

    #[error("include cycle: {}", path.join(" -> "))]
    IncludeCycle { path: Vec<String> },

    #[error("include depth limit of {limit} exceeded at tag '{tag}'")]
    IncludeDepth { tag: String, limit: usize },

    #[error("context key '{key}' is missing")]
    MissingKey { key: String },

    #[error("context key '{key}' holds a {found}, expected a {expected}")]
    ShapeMismatch {
        key: String,
        expected: Shape,
        found: Shape,
    },

    #[error("{message}\n  while executing: {sql}")]
    Driver { sql: String, message: String },

    #[error("expected exactly one row, got none from: {sql}")]
    NoRows { sql: String },

    #[error("expected at most one row, got more from: {sql}")]
    TooManyRows { sql: String },

    #[error("librarian is not connected")]
    NotConnected,

    #[error("failed to read template source {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LibrarianError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibrarianError::TagNotFound { .. }
            | LibrarianError::InvalidTag { .. }
            | LibrarianError::UnknownSelectMode { .. }
            | LibrarianError::MalformedInclude { .. }
            | LibrarianError::IncludeCycle { .. }
            | LibrarianError::IncludeDepth { .. } => ErrorKind::Compile,
            LibrarianError::MissingKey { .. } | LibrarianError::ShapeMismatch { .. } => {
                ErrorKind::BindResolution
            }
            LibrarianError::Driver { .. } => ErrorKind::Driver,
            LibrarianError::NoRows { .. } | LibrarianError::TooManyRows { .. } => {
                ErrorKind::Cardinality
            }
            LibrarianError::NotConnected => ErrorKind::Connection,
            LibrarianError::Archive { .. } => ErrorKind::Archive,
        }
    }

    /// Wraps a driver report with the SQL text that produced it.
    pub(crate) fn driver(sql: &str, report: eyre::Report) -> Self {
        LibrarianError::Driver {
            sql: sql.to_string(),
            message: format!("{:#}", report),
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LibrarianError::Archive {
            path: path.into(),
            source,
        }
    }
}
