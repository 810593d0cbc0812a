//! Fuzz testing for chain compilation.
//!
//! Splits arbitrary template bodies into blocks and compiles them without
//! preparing, so only the parsing paths run. Compilation may fail, it must
//! never panic.
//!
//! Run with: `cargo +nightly fuzz run fuzz_chain`

#![no_main]

use libfuzzer_sys::fuzz_target;
use librarian::chain::split_blocks;
use librarian::{ChainEntry, SqliteConnection, StatementChain};

fuzz_target!(|body: &str| {
    let blocks = split_blocks(body);
    for block in &blocks {
        assert!(!block.is_empty());
        assert_eq!(block.trim(), *block);
    }

    let Ok(mut conn) = SqliteConnection::open_in_memory() else {
        return;
    };
    if let Ok(chain) = StatementChain::compile("fuzz", body, &mut conn, false) {
        assert_eq!(chain.len(), blocks.len());
        for entry in chain.entries() {
            if let ChainEntry::Include(tag) = entry {
                assert!(!tag.is_empty());
            }
        }
    }
});
