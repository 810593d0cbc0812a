//! # Librarian Configuration Constants
//!
//! This module centralizes the constants shared by the template format, the
//! archivers, the execution coordinator, and the SQLite driver. Values that
//! depend on each other are co-located and checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_MAX_INCLUDE_DEPTH (32)
//!       │
//!       └─> HARD_MAX_INCLUDE_DEPTH (must be >=)
//!             The configured depth is clamped to the hard limit so a
//!             misconfigured value cannot turn a cyclic include into
//!             unbounded recursion.
//!
//! BLOCK_TERMINATOR (";;")
//!       │
//!       └─> STATEMENT_TERMINATOR (';', must be its first character)
//!             A block file closes a tag with a line holding only ";;".
//!             The chain compiler strips a single trailing ';' per statement.
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use librarian::config::{DEFAULT_TEMPLATE_EXTENSION, DEFAULT_MAX_INCLUDE_DEPTH};
//! ```

// ============================================================================
// TEMPLATE FORMAT
// Syntax shared by the parser, the chain compiler, and the block archiver
// ============================================================================

/// Sigil that introduces a bind variable (`:name`).
pub const BIND_SIGIL: char = ':';

/// Sigil that introduces a direct substitution (`$name`).
pub const SUBSTITUTION_SIGIL: char = '$';

/// Character stripped once from the end of every statement block.
pub const STATEMENT_TERMINATOR: char = ';';

/// Keyword that turns a block into a reference to another tag.
pub const INCLUDE_KEYWORD: &str = "include";

/// Line that closes a tag inside a block file.
pub const BLOCK_TERMINATOR: &str = ";;";

const _: () = assert!(
    BLOCK_TERMINATOR.as_bytes()[0] == STATEMENT_TERMINATOR as u8,
    "BLOCK_TERMINATOR must start with STATEMENT_TERMINATOR"
);

// ============================================================================
// ARCHIVE LAYOUT
// ============================================================================

/// Extension of one-tag-per-file templates (`insert_bug.sql`).
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "sql";

/// Extension of files holding many `tag:` ... `;;` blocks.
pub const DEFAULT_BLOCK_EXTENSION: &str = "lib";

// ============================================================================
// EXECUTION
// ============================================================================

/// Default bound on nested includes walked by one `execute` call.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Upper bound applied to any configured include depth.
pub const HARD_MAX_INCLUDE_DEPTH: usize = 256;

const _: () = assert!(
    DEFAULT_MAX_INCLUDE_DEPTH <= HARD_MAX_INCLUDE_DEPTH,
    "DEFAULT_MAX_INCLUDE_DEPTH must not exceed HARD_MAX_INCLUDE_DEPTH"
);

/// Rows requested from the driver by single-row select modes. One row is
/// merged, the second one only proves the result was ambiguous.
pub const SINGLE_ROW_FETCH_LIMIT: usize = 2;

// ============================================================================
// SQLITE DRIVER
// ============================================================================

/// Capacity of the rusqlite prepared statement cache.
pub const SQLITE_STATEMENT_CACHE_CAPACITY: usize = 64;
