//! Fuzz testing for the placeholder parser and select classifier.
//!
//! Feeds arbitrary text through bind rewriting, substitution and
//! classification, checking that marker counts line up with the collected
//! bind names.
//!
//! Run with: `cargo +nightly fuzz run fuzz_placeholders`

#![no_main]

use libfuzzer_sys::fuzz_target;
use librarian::parsing::{classify, parse_placeholders, substitute, StatementKind};

fuzz_target!(|sql: &str| {
    let parsed = parse_placeholders(sql, |n| format!("?{n}"));

    let before = sql.matches('?').count();
    let after = parsed.sql.matches('?').count();
    assert_eq!(after, before + parsed.binds.len());

    for name in parsed.binds.iter().chain(&parsed.substitutions) {
        assert!(!name.is_empty());
        assert!(!name.starts_with('.') && !name.ends_with('.'));
    }

    let mut seen = 0;
    let rendered = substitute(&parsed.sql, |name| {
        seen += 1;
        assert!(parsed.substitutions.iter().any(|s| s == name));
        Ok(String::new())
    });
    assert!(rendered.is_ok());
    if parsed.substitutions.is_empty() {
        assert_eq!(seen, 0);
    }

    if let Ok(classified) = classify(sql) {
        match classified.kind {
            StatementKind::Mutation => assert_eq!(classified.sql, sql),
            StatementKind::Select(_) => assert!(classified.sql.len() <= sql.len()),
        }
    }
});
