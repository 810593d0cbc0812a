//! # Template Parsing
//!
//! This module turns the text of one template statement into the pieces a
//! [`CompiledStatement`](crate::statement::CompiledStatement) is built from.
//!
//! ## Module Structure
//!
//! - `placeholders`: `:bind` and `$substitution` scanning and rewriting
//! - `select`: row-cardinality classification from `select` suffixes
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌────────────┐    ┌──────────────────────┐
//! │ block text   │───>│  classify  │───>│ parse_placeholders   │
//! │ SELECT1 :id  │    │ Select(1)  │    │ SELECT ?  binds=[id] │
//! └──────────────┘    └────────────┘    └──────────────────────┘
//! ```
//!
//! Classification runs first so the suffix is gone before any marker is
//! rewritten; both steps only look at the statement text.

pub mod placeholders;
pub mod select;

pub use placeholders::{
    parse_placeholders, substitute, ParsedStatement, Placeholder, PlaceholderScanner, Sigil,
};
pub use select::{classify, Classified, SelectMode, StatementKind};
