//! # Context and Value Types
//!
//! This module provides the data model shared by every statement: scalar
//! values and the nested context that carries them in and out of SQL.
//!
//! ## Module Structure
//!
//! - `value`: Fully-owned scalar `Value`
//! - `context`: Recursive `Context` / `Datum` with shape-checked accessors
//! - `json`: Conversion between contexts and `serde_json::Value`
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Value` | Scalar bound to or fetched from the driver |
//! | `Datum` | Scalar, mapping, or sequence stored under a key |
//! | `Context` | Keyed mapping passed to `Librarian::execute` |
//! | `Shape` | Structural category reported by mismatch errors |
//!
//! ## Usage
//!
//! ```ignore
//! use librarian::types::{Context, Value};
//!
//! let mut ctx = Context::new().with("bugid", 5);
//! librarian.execute("find_bug", &mut ctx)?;
//! let title = ctx.scalar("title");
//! ```

mod context;
mod json;
mod value;

pub use context::{Context, Datum, Shape};
pub use value::Value;
