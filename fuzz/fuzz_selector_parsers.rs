//! Fuzz target for the selection-criteria parsers.
//!
//! Run with: cargo +nightly fuzz run fuzz_selector_parsers
//!
//! Exercises the path-expression, content-query, and shorthand-rule parsers
//! with arbitrary input to find panics or hangs.

#![no_main]

use albumforge_core::jsonpath::PathExpr;
use albumforge_core::query::ContentQuery;
use albumforge_core::rules::LocalFilterRule;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // None of these should panic on arbitrary input
        let _ = PathExpr::parse(s);
        let _ = ContentQuery::parse(s);
        let _ = LocalFilterRule::from_shorthand(s);
    }
});
