//! Fuzz target for JSON-lines input parsing.
//!
//! Tests that schema inference and record building handle arbitrary input
//! without panicking, and that every record shares the inferred schema.

#![no_main]

use dlp_store::parse_jsonl;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(records) = parse_jsonl(data) {
        if let Some(first) = records.first() {
            assert!(records
                .iter()
                .all(|r| std::sync::Arc::ptr_eq(r.schema(), first.schema())));
        }
    }
});
