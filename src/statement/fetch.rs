//! # Row Fetch Contracts
//!
//! Each [`SelectMode`] owns one fetch function, looked up through a single
//! dispatch table. A fetch function receives the rows returned by the driver
//! and merges them into the context.
//!
//! ## Column Labels
//!
//! ```text
//! label        single-row mode              ZeroOrMore mode
//! ─────────    ─────────────────────────    ──────────────────────────────
//! title        ctx.title = v                ctx.title = [v1, v2, ...]
//! bug.title    ctx.bug = { title: v }       ctx.bug = [{title: v1}, ...]
//! ```
//!
//! A label is split at its first dot. Every ZeroOrMore target key is reset
//! to an empty sequence before the first row, so zero rows leave empty
//! sequences behind. A target key already holding a scalar or a mapping is a
//! shape mismatch, never overwritten.
//!
//! ## Cardinality
//!
//! Single-row modes merge the first row before looking for a second one, so
//! a `TooManyRows` error leaves the first row in the context.

use smallvec::SmallVec;

use crate::config::SINGLE_ROW_FETCH_LIMIT;
use crate::driver::{Row, RowSet};
use crate::error::{LibrarianError, Result};
use crate::parsing::SelectMode;
use crate::types::{Context, Datum};

pub(crate) struct FetchOptions<'a> {
    pub first_of_seq: bool,
    /// Statement text, reported by cardinality errors.
    pub sql: &'a str,
}

pub(crate) type FetchFn = fn(&RowSet, &mut Context, &FetchOptions<'_>) -> Result<()>;

/// Indexed by `SelectMode as usize`.
const FETCHERS: [FetchFn; 3] = [fetch_exactly_one, fetch_zero_or_one, fetch_zero_or_more];

impl SelectMode {
    pub(crate) fn fetcher(self) -> FetchFn {
        FETCHERS[self as usize]
    }

    /// Rows to request from the driver.
    pub fn row_limit(self) -> Option<usize> {
        match self {
            SelectMode::ZeroOrMore => None,
            SelectMode::ExactlyOne | SelectMode::ZeroOrOne => Some(SINGLE_ROW_FETCH_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Bare(&'a str),
    Nested { group: &'a str, field: &'a str },
}

impl<'a> Target<'a> {
    fn of(label: &'a str) -> Self {
        match label.split_once('.') {
            Some((group, field)) if !group.is_empty() && !field.is_empty() => {
                Target::Nested { group, field }
            }
            _ => Target::Bare(label),
        }
    }

    fn key(self) -> &'a str {
        match self {
            Target::Bare(name) => name,
            Target::Nested { group, .. } => group,
        }
    }
}

fn fetch_exactly_one(rows: &RowSet, ctx: &mut Context, opts: &FetchOptions<'_>) -> Result<()> {
    fetch_single(rows, ctx, opts, true)
}

fn fetch_zero_or_one(rows: &RowSet, ctx: &mut Context, opts: &FetchOptions<'_>) -> Result<()> {
    fetch_single(rows, ctx, opts, false)
}

fn fetch_single(
    rows: &RowSet,
    ctx: &mut Context,
    opts: &FetchOptions<'_>,
    required: bool,
) -> Result<()> {
    let mut iter = rows.rows.iter();

    let Some(first) = iter.next() else {
        if required {
            return Err(LibrarianError::NoRows {
                sql: opts.sql.to_string(),
            });
        }
        return Ok(());
    };

    merge_row(&rows.columns, first, ctx, opts.first_of_seq)?;

    if iter.next().is_some() {
        return Err(LibrarianError::TooManyRows {
            sql: opts.sql.to_string(),
        });
    }
    Ok(())
}

fn merge_row(columns: &[String], row: &Row, ctx: &mut Context, first_of_seq: bool) -> Result<()> {
    for (label, value) in columns.iter().zip(&row.values) {
        match Target::of(label) {
            Target::Bare(name) => ctx.assign(name, value.clone(), first_of_seq)?,
            Target::Nested { group, field } => {
                ctx.assign_nested(group, field, value.clone(), first_of_seq)?
            }
        }
    }
    Ok(())
}

fn fetch_zero_or_more(rows: &RowSet, ctx: &mut Context, _opts: &FetchOptions<'_>) -> Result<()> {
    let targets: SmallVec<[Target<'_>; 8]> = rows.columns.iter().map(|c| Target::of(c)).collect();

    let mut keys: SmallVec<[&str; 8]> = SmallVec::new();
    for target in &targets {
        if !keys.contains(&target.key()) {
            keys.push(target.key());
        }
    }
    for key in &keys {
        ctx.reset_sequence(key)?;
    }

    for row in &rows.rows {
        let mut groups: SmallVec<[(&str, Context); 2]> = SmallVec::new();

        for (target, value) in targets.iter().zip(&row.values) {
            match *target {
                Target::Bare(name) => ctx.push(name, Datum::Scalar(value.clone()))?,
                Target::Nested { group, field } => {
                    let slot = match groups.iter().position(|(g, _)| *g == group) {
                        Some(i) => i,
                        None => {
                            groups.push((group, Context::new()));
                            groups.len() - 1
                        }
                    };
                    groups[slot].1.insert(field, value.clone());
                }
            }
        }

        for (group, record) in groups {
            ctx.push(group, Datum::Map(record))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Shape, Value};

    fn rows(columns: &[&str], data: Vec<Vec<Value>>) -> RowSet {
        let mut set = RowSet::new(columns.iter().map(|c| c.to_string()).collect());
        for values in data {
            set.push(values);
        }
        set
    }

    fn opts() -> FetchOptions<'static> {
        FetchOptions {
            first_of_seq: false,
            sql: "SELECT ...",
        }
    }

    #[test]
    fn dispatch_table_matches_modes() {
        let empty = rows(&["a"], vec![]);
        let mut ctx = Context::new();

        let exactly_one = SelectMode::ExactlyOne.fetcher();
        assert!(matches!(
            exactly_one(&empty, &mut ctx, &opts()),
            Err(LibrarianError::NoRows { .. })
        ));

        let zero_or_one = SelectMode::ZeroOrOne.fetcher();
        assert!(zero_or_one(&empty, &mut ctx, &opts()).is_ok());
        assert!(ctx.is_empty());

        let zero_or_more = SelectMode::ZeroOrMore.fetcher();
        zero_or_more(&empty, &mut ctx, &opts()).unwrap();
        assert_eq!(ctx.sequence("a").unwrap().len(), 0);
    }

    #[test]
    fn single_row_merges_flat_and_nested() {
        let set = rows(&["bugid", "owner.name"], vec![vec![Value::Int(5), "ann".into()]]);
        let mut ctx = Context::new();
        fetch_exactly_one(&set, &mut ctx, &opts()).unwrap();

        assert_eq!(ctx.scalar("bugid"), Some(&Value::Int(5)));
        assert_eq!(
            ctx.map("owner").unwrap().scalar("name"),
            Some(&Value::Text("ann".into()))
        );
    }

    #[test]
    fn second_row_fails_after_first_is_merged() {
        let set = rows(&["bugid"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let mut ctx = Context::new();
        let err = fetch_zero_or_one(&set, &mut ctx, &opts()).unwrap_err();

        assert!(matches!(err, LibrarianError::TooManyRows { .. }));
        assert_eq!(ctx.scalar("bugid"), Some(&Value::Int(1)));
    }

    #[test]
    fn zero_or_more_groups_dotted_labels_per_row() {
        let set = rows(
            &["bug.id", "bug.title"],
            vec![
                vec![Value::Int(1), "a".into()],
                vec![Value::Int(2), "b".into()],
                vec![Value::Int(3), "c".into()],
            ],
        );
        let mut ctx = Context::new();
        fetch_zero_or_more(&set, &mut ctx, &opts()).unwrap();

        let bugs = ctx.sequence("bug").unwrap();
        assert_eq!(bugs.len(), 3);
        assert_eq!(bugs[1].as_map().unwrap().scalar("id"), Some(&Value::Int(2)));
        assert_eq!(
            bugs[2].as_map().unwrap().scalar("title"),
            Some(&Value::Text("c".into()))
        );
    }

    #[test]
    fn zero_or_more_bare_column_becomes_scalar_sequence() {
        let set = rows(&["id"], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let mut ctx = Context::new();
        fetch_zero_or_more(&set, &mut ctx, &opts()).unwrap();
        assert_eq!(
            ctx.sequence("id").unwrap(),
            &[Datum::from(1), Datum::from(2)]
        );
    }

    #[test]
    fn zero_or_more_refuses_to_overwrite_scalar() {
        let set = rows(&["id"], vec![vec![Value::Int(1)]]);
        let mut ctx = Context::new().with("id", 99);
        let err = fetch_zero_or_more(&set, &mut ctx, &opts()).unwrap_err();

        assert!(matches!(
            err,
            LibrarianError::ShapeMismatch {
                expected: Shape::Sequence,
                found: Shape::Scalar,
                ..
            }
        ));
        assert_eq!(ctx.scalar("id"), Some(&Value::Int(99)));
    }

    #[test]
    fn zero_or_more_replaces_previous_sequence() {
        let set = rows(&["id"], vec![vec![Value::Int(7)]]);
        let mut ctx = Context::new().with("id", vec![Datum::from(1), Datum::from(2)]);
        fetch_zero_or_more(&set, &mut ctx, &opts()).unwrap();
        assert_eq!(ctx.sequence("id").unwrap(), &[Datum::from(7)]);
    }

    #[test]
    fn first_of_sequence_writes_index_zero() {
        let set = rows(&["id", "bug.title"], vec![vec![Value::Int(4), "x".into()]]);
        let mut ctx = Context::new();
        let opts = FetchOptions {
            first_of_seq: true,
            sql: "SELECT ...",
        };
        fetch_exactly_one(&set, &mut ctx, &opts).unwrap();

        assert_eq!(ctx.sequence("id").unwrap(), &[Datum::from(4)]);
        let bug = ctx.sequence("bug").unwrap();
        assert_eq!(
            bug[0].as_map().unwrap().scalar("title"),
            Some(&Value::Text("x".into()))
        );
    }
}
