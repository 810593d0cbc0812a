//! Fuzz testing for context JSON conversion and path resolution.
//!
//! Run with: `cargo +nightly fuzz run fuzz_context`

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use librarian::Context;

#[derive(Arbitrary, Debug)]
struct ContextInput {
    json: String,
    path: String,
    first_of_seq: bool,
}

fuzz_target!(|input: ContextInput| {
    let Ok(ctx) = Context::from_json_str(&input.json) else {
        return;
    };

    let _ = ctx.resolve(&input.path, input.first_of_seq);

    let again = Context::from_json(&ctx.to_json());
    assert!(again.is_ok());
});
