//! # Compiled Statements
//!
//! A [`CompiledStatement`] is one SQL template statement after placeholder
//! parsing and select classification. It keeps everything needed to run the
//! statement repeatedly against a [`Connection`](crate::driver::Connection):
//!
//! ```text
//! template text ──► classify ──► parse_placeholders ──► CompiledStatement
//!                                                          │
//!                 ┌────────────────────────────────────────┘
//!                 ▼
//!   execute(conn, ctx) ─► substitute $names (re-prepare) ─► bind :names
//!                         ─► driver execute / query ─► fetch into ctx
//! ```
//!
//! Mutations report the driver's affected-row count. Selects write their
//! rows into the context through the fetch function of their
//! [`SelectMode`](crate::parsing::SelectMode) and report 0.

mod compiled;
pub(crate) mod fetch;

pub use compiled::CompiledStatement;
