//! # Statement Chains
//!
//! A tag's template body may hold several statements. The chain compiler
//! splits the body into blocks, turns `include` blocks into references to
//! other tags, and compiles every other block into a [`CompiledStatement`].
//!
//! ## Block Splitting
//!
//! Blocks are separated by one or more blank (whitespace-only) lines. Each
//! block is trimmed, empty blocks are dropped, and a single trailing `;` is
//! removed:
//!
//! ```text
//! INSERT INTO bug (title)          ┐
//! VALUES (:title);                 ┘ block 1: statement
//!
//!
//! include last_bugid               ─ block 2: include reference
//!
//! UPDATE counters SET n = n + 1;   ─ block 3: statement
//! ```
//!
//! A statement spanning several lines must not contain blank lines.
//!
//! ## Includes
//!
//! An include block is `include <tag>`, keyword case-insensitive, with
//! exactly one tag token. Anything else whose first word is `include` is a
//! `MalformedInclude` error. The chain only records the tag; compiling and
//! running the included chain is the coordinator's job, so that cached
//! chains are shared and cycles are detected across the whole include tree.

use tracing::trace;

use crate::config::{INCLUDE_KEYWORD, STATEMENT_TERMINATOR};
use crate::driver::Connection;
use crate::error::{LibrarianError, Result};
use crate::statement::CompiledStatement;

#[derive(Debug, Clone, PartialEq)]
pub enum ChainEntry {
    Statement(CompiledStatement),
    Include(String),
}

/// The compiled, ordered contents of one tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementChain {
    tag: String,
    entries: Vec<ChainEntry>,
}

impl StatementChain {
    pub fn compile<C>(tag: &str, body: &str, conn: &mut C, prepare: bool) -> Result<Self>
    where
        C: Connection + ?Sized,
    {
        let mut entries = Vec::new();

        for block in split_blocks(body) {
            let entry = match parse_include(block)? {
                Some(included) => ChainEntry::Include(included.to_string()),
                None => ChainEntry::Statement(CompiledStatement::compile(block, conn, prepare)?),
            };
            entries.push(entry);
        }

        trace!(tag, entries = entries.len(), "compiled statement chain");
        Ok(Self {
            tag: tag.to_string(),
            entries,
        })
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags referenced by include entries, in chain order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            ChainEntry::Include(tag) => Some(tag.as_str()),
            ChainEntry::Statement(_) => None,
        })
    }

    pub fn statements(&self) -> impl Iterator<Item = &CompiledStatement> {
        self.entries.iter().filter_map(|entry| match entry {
            ChainEntry::Statement(stmt) => Some(stmt),
            ChainEntry::Include(_) => None,
        })
    }
}

/// Splits a template body into trimmed, non-empty statement blocks.
pub fn split_blocks(body: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                blocks.push(&body[s..end]);
            }
        } else {
            if start.is_none() {
                start = Some(offset);
            }
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        blocks.push(&body[s..end]);
    }

    blocks
        .into_iter()
        .map(clean_block)
        .filter(|block| !block.is_empty())
        .collect()
}

fn clean_block(block: &str) -> &str {
    let trimmed = block.trim();
    trimmed
        .strip_suffix(STATEMENT_TERMINATOR)
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// Returns the included tag when `block` is an include directive.
fn parse_include(block: &str) -> Result<Option<&str>> {
    let mut words = block.split_whitespace();
    let is_include = words
        .next()
        .is_some_and(|first| first.eq_ignore_ascii_case(INCLUDE_KEYWORD));
    if !is_include {
        return Ok(None);
    }

    match (words.next(), words.next()) {
        (Some(tag), None) => Ok(Some(tag)),
        _ => Err(LibrarianError::MalformedInclude {
            directive: block.to_string(),
        }),
    }
}
