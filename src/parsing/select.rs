//! # Select Classifier
//!
//! Decides how many rows a statement is expected to return from a suffix
//! glued to its leading `select` keyword, then strips the suffix so the
//! driver only ever sees plain SQL.
//!
//! | Leading word | Kind |
//! |--------------|------|
//! | `select`, `select*` | `Select(ZeroOrMore)` |
//! | `select?` | `Select(ZeroOrOne)` |
//! | `select1` | `Select(ExactlyOne)` |
//! | `select<anything else>` | compile error |
//! | anything else | `Mutation` |
//!
//! The keyword is matched case-insensitively after leading whitespace and
//! `--` line comments. The suffix ends at whitespace or `(`, so
//! `SELECT(1)` stays a plain select.

use crate::error::{LibrarianError, Result};

const SELECT_KEYWORD: &str = "select";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectMode {
    ExactlyOne,
    ZeroOrOne,
    ZeroOrMore,
}

impl SelectMode {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" | "*" => Some(SelectMode::ZeroOrMore),
            "?" => Some(SelectMode::ZeroOrOne),
            "1" => Some(SelectMode::ExactlyOne),
            _ => None,
        }
    }

    /// Canonical suffix, as written in templates.
    pub fn suffix(self) -> &'static str {
        match self {
            SelectMode::ExactlyOne => "1",
            SelectMode::ZeroOrOne => "?",
            SelectMode::ZeroOrMore => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Mutation,
    Select(SelectMode),
}

impl StatementKind {
    pub fn is_select(self) -> bool {
        matches!(self, StatementKind::Select(_))
    }

    pub fn select_mode(self) -> Option<SelectMode> {
        match self {
            StatementKind::Select(mode) => Some(mode),
            StatementKind::Mutation => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: StatementKind,
    /// Statement text with the mode suffix removed.
    pub sql: String,
}

pub fn classify(sql: &str) -> Result<Classified> {
    let start = leading_keyword_offset(sql);
    let rest = &sql[start..];

    let is_select = rest
        .get(..SELECT_KEYWORD.len())
        .is_some_and(|word| word.eq_ignore_ascii_case(SELECT_KEYWORD));
    if !is_select {
        return Ok(Classified {
            kind: StatementKind::Mutation,
            sql: sql.to_string(),
        });
    }

    let after_keyword = start + SELECT_KEYWORD.len();
    let suffix_len = sql[after_keyword..]
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(sql.len() - after_keyword);
    let suffix = &sql[after_keyword..after_keyword + suffix_len];

    let mode = SelectMode::from_suffix(suffix).ok_or_else(|| LibrarianError::UnknownSelectMode {
        suffix: suffix.to_string(),
        sql: sql.to_string(),
    })?;

    let mut stripped = String::with_capacity(sql.len());
    stripped.push_str(&sql[..after_keyword]);
    stripped.push_str(&sql[after_keyword + suffix_len..]);

    Ok(Classified {
        kind: StatementKind::Select(mode),
        sql: stripped,
    })
}

/// Byte offset of the first token that is neither whitespace nor part of a
/// `--` line comment.
fn leading_keyword_offset(sql: &str) -> usize {
    let mut pos = 0;
    loop {
        let rest = &sql[pos..];
        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();

        if !trimmed.starts_with("--") {
            return pos;
        }
        match trimmed.find('\n') {
            Some(newline) => pos += newline + 1,
            None => return sql.len(),
        }
    }
}
