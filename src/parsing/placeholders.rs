//! # Placeholder Parser
//!
//! Finds the two placeholder syntaxes of a SQL template and produces the
//! normalized statement handed to the driver.
//!
//! ## Syntax
//!
//! | Sigil | Example | Meaning | Rewritten at |
//! |-------|---------|---------|--------------|
//! | `:` | `:bugid` | bind variable | compile time, to a positional marker |
//! | `$` | `$table` | direct substitution | every execution, to literal text |
//!
//! A name is `[A-Za-z_][A-Za-z0-9_]*`, optionally followed by more
//! `.`-separated segments (`:bug.id`) addressing nested mappings.
//!
//! A `:` only counts when the character before it is not a word character
//! and not another `:`. This keeps `::int` casts and `a:b` identifiers
//! untouched. A `$` counts wherever it is followed by a name, so it can
//! splice into an identifier (`FROM log_$year`). A `$` followed by a digit
//! (`$1`) is a driver parameter, not a substitution.
//!
//! ## Bind Variables
//!
//! Each occurrence is replaced, left to right, by the marker returned for its
//! 1-based position. Repeated names are kept once per occurrence:
//!
//! ```text
//! SELECT * FROM bug WHERE owner = :who OR reporter = :who
//!   ──> SELECT * FROM bug WHERE owner = ? OR reporter = ?
//!       binds = [who, who]
//! ```
//!
//! ## Direct Substitutions
//!
//! Substitution markers stay in the normalized text; [`substitute`] replaces
//! them right before each execution, so they can carry table names or column
//! lists that bound parameters cannot express.
//!
//! ## Limitations
//!
//! The scanner does not understand string literals or comments. A sigil
//! inside `'...'` or after `--` is treated like any other placeholder.

use std::ops::Range;

use smallvec::SmallVec;

use crate::config::{BIND_SIGIL, SUBSTITUTION_SIGIL};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sigil {
    Bind,
    Substitution,
}

impl Sigil {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            b if b == BIND_SIGIL as u8 => Some(Sigil::Bind),
            b if b == SUBSTITUTION_SIGIL as u8 => Some(Sigil::Substitution),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub sigil: Sigil,
    pub name: &'a str,
    /// Byte range of the sigil and the name in the scanned text.
    pub span: Range<usize>,
}

/// Iterator over the placeholders of a SQL text, in source order.
pub struct PlaceholderScanner<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PlaceholderScanner<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn current(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.bytes.get(pos).copied()
    }

    fn sigil_counts(&self, sigil: Sigil, sigil_pos: usize) -> bool {
        if !self.byte_at(sigil_pos + 1).is_some_and(is_name_start) {
            return false;
        }
        match sigil {
            Sigil::Bind => match sigil_pos.checked_sub(1).and_then(|p| self.byte_at(p)) {
                Some(prev) => !is_word_byte(prev) && prev != BIND_SIGIL as u8,
                None => true,
            },
            // substitutions may be glued to surrounding text: `log_$year`
            Sigil::Substitution => true,
        }
    }

    fn scan_name(&mut self) -> &'a str {
        let start = self.pos;

        loop {
            while !self.is_eof() && is_word_byte(self.current()) {
                self.pos += 1;
            }

            let dotted = !self.is_eof()
                && self.current() == b'.'
                && self.byte_at(self.pos + 1).is_some_and(is_name_start);
            if !dotted {
                break;
            }
            self.pos += 1;
        }

        &self.input[start..self.pos]
    }
}

impl<'a> Iterator for PlaceholderScanner<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.is_eof() {
            let start = self.pos;
            let Some(sigil) = Sigil::from_byte(self.current()) else {
                self.pos += 1;
                continue;
            };

            if !self.sigil_counts(sigil, start) {
                self.pos += 1;
                continue;
            }

            self.pos += 1;
            let name = self.scan_name();
            return Some(Placeholder {
                sigil,
                name,
                span: start..self.pos,
            });
        }
        None
    }
}

/// A template statement after bind markers were rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    pub sql: String,
    pub binds: SmallVec<[String; 4]>,
    pub substitutions: SmallVec<[String; 2]>,
}

/// Rewrites bind markers with `marker(n)` (1-based) and collects names.
pub fn parse_placeholders<F>(sql: &str, mut marker: F) -> ParsedStatement
where
    F: FnMut(usize) -> String,
{
    let mut normalized = String::with_capacity(sql.len());
    let mut binds: SmallVec<[String; 4]> = SmallVec::new();
    let mut substitutions: SmallVec<[String; 2]> = SmallVec::new();
    let mut copied = 0;

    for placeholder in PlaceholderScanner::new(sql) {
        match placeholder.sigil {
            Sigil::Bind => {
                normalized.push_str(&sql[copied..placeholder.span.start]);
                binds.push(placeholder.name.to_string());
                normalized.push_str(&marker(binds.len()));
                copied = placeholder.span.end;
            }
            Sigil::Substitution => {
                if !substitutions.iter().any(|s| s == placeholder.name) {
                    substitutions.push(placeholder.name.to_string());
                }
            }
        }
    }
    normalized.push_str(&sql[copied..]);

    ParsedStatement {
        sql: normalized,
        binds,
        substitutions,
    }
}

/// Replaces every substitution marker with the text produced by `lookup`.
///
/// Bind markers are left alone; callers run this on normalized SQL where
/// they were already rewritten.
pub fn substitute<F>(sql: &str, mut lookup: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut out = String::with_capacity(sql.len());
    let mut copied = 0;

    for placeholder in PlaceholderScanner::new(sql) {
        if placeholder.sigil != Sigil::Substitution {
            continue;
        }
        out.push_str(&sql[copied..placeholder.span.start]);
        out.push_str(&lookup(placeholder.name)?);
        copied = placeholder.span.end;
    }
    out.push_str(&sql[copied..]);

    Ok(out)
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibrarianError;

    fn question(_: usize) -> String {
        "?".to_string()
    }

    #[test]
    fn binds_become_positional_markers_in_order() {
        let parsed = parse_placeholders(
            "INSERT INTO bug (bugid, title) VALUES (:bugid, :title)",
            question,
        );
        assert_eq!(parsed.sql, "INSERT INTO bug (bugid, title) VALUES (?, ?)");
        assert_eq!(parsed.binds.as_slice(), ["bugid", "title"]);
        assert!(parsed.substitutions.is_empty());
    }

    #[test]
    fn repeated_binds_are_kept_per_occurrence() {
        let parsed = parse_placeholders("SELECT * FROM bug WHERE a = :who OR b = :who", question);
        assert_eq!(parsed.binds.as_slice(), ["who", "who"]);
        assert_eq!(parsed.sql.matches('?').count(), 2);
    }

    #[test]
    fn numbered_markers_follow_occurrence_order() {
        let parsed = parse_placeholders("VALUES (:a, :b, :a)", |n| format!("${}", n));
        assert_eq!(parsed.sql, "VALUES ($1, $2, $3)");
        assert_eq!(parsed.binds.as_slice(), ["a", "b", "a"]);
    }

    #[test]
    fn double_colon_cast_is_not_a_bind() {
        let parsed = parse_placeholders("SELECT created::date FROM bug WHERE id = :id", question);
        assert_eq!(parsed.sql, "SELECT created::date FROM bug WHERE id = ?");
        assert_eq!(parsed.binds.as_slice(), ["id"]);
    }

    #[test]
    fn colon_after_word_is_not_a_bind() {
        let parsed = parse_placeholders("SELECT a:b, '12:30' FROM t", question);
        assert!(parsed.binds.is_empty());
        assert_eq!(parsed.sql, "SELECT a:b, '12:30' FROM t");
    }

    #[test]
    fn dotted_bind_names() {
        let parsed = parse_placeholders("WHERE id = :bug.id AND x = :y.", question);
        assert_eq!(parsed.binds.as_slice(), ["bug.id", "y"]);
        assert_eq!(parsed.sql, "WHERE id = ? AND x = ?.");
    }

    #[test]
    fn substitutions_are_kept_verbatim_and_deduplicated() {
        let parsed = parse_placeholders("SELECT $cols FROM $table WHERE $cols IS NOT NULL", question);
        assert_eq!(parsed.sql, "SELECT $cols FROM $table WHERE $cols IS NOT NULL");
        assert_eq!(parsed.substitutions.as_slice(), ["cols", "table"]);
    }

    #[test]
    fn positional_dollars_are_ignored() {
        let parsed = parse_placeholders("SELECT $1, $2 FROM t WHERE a = $$", question);
        assert!(parsed.substitutions.is_empty());
    }

    #[test]
    fn substitution_inside_identifier() {
        let parsed = parse_placeholders("SELECT1 x FROM log_$year WHERE id = :id", question);
        assert_eq!(parsed.substitutions.as_slice(), ["year"]);
        assert_eq!(parsed.binds.as_slice(), ["id"]);

        let out = substitute(&parsed.sql, |_| Ok("2024".to_string())).unwrap();
        assert_eq!(out, "SELECT1 x FROM log_2024 WHERE id = ?");
    }

    #[test]
    fn sigils_inside_literals_are_still_matched() {
        let parsed = parse_placeholders("SELECT ' :note ' FROM t", question);
        assert_eq!(parsed.binds.as_slice(), ["note"]);
    }

    #[test]
    fn marker_count_matches_bind_count() {
        let sql = "UPDATE t SET a = :a, b = :b, c = :a WHERE d = :d AND e = :e";
        let parsed = parse_placeholders(sql, question);
        assert_eq!(parsed.sql.matches('?').count(), parsed.binds.len());
        assert_eq!(parsed.binds.len(), 5);
    }

    #[test]
    fn substitute_replaces_every_occurrence() {
        let out = substitute("SELECT $col FROM $table ORDER BY $col", |name| {
            Ok(match name {
                "col" => "title".to_string(),
                _ => "bug".to_string(),
            })
        })
        .unwrap();
        assert_eq!(out, "SELECT title FROM bug ORDER BY title");
    }

    #[test]
    fn substitute_respects_name_boundaries() {
        let out = substitute("$id $identity", |name| Ok(format!("<{}>", name))).unwrap();
        assert_eq!(out, "<id> <identity>");
    }

    #[test]
    fn substitute_propagates_lookup_errors() {
        let err = substitute("FROM $table", |name| {
            Err(LibrarianError::MissingKey {
                key: name.to_string(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, LibrarianError::MissingKey { ref key } if key == "table"));
    }
}
