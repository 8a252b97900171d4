//! Fuzz target for the field redactor.
//!
//! Redacting arbitrary text with any built-in category must never panic,
//! must be idempotent, and must leave nothing the category still matches.

#![no_main]

use std::sync::{Arc, OnceLock};

use arbitrary::Arbitrary;
use dlp_redact::{FieldRedactor, PatternRegistry, BUILTIN_CATEGORIES};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    category: u8,
    text: String,
}

fn redactor() -> &'static FieldRedactor {
    static REDACTOR: OnceLock<FieldRedactor> = OnceLock::new();
    REDACTOR.get_or_init(|| {
        let registry = PatternRegistry::with_defaults().expect("built-in patterns are valid");
        FieldRedactor::new(Arc::new(registry))
    })
}

fuzz_target!(|input: Input| {
    let category = BUILTIN_CATEGORIES[input.category as usize % BUILTIN_CATEGORIES.len()];
    let redactor = redactor();

    let first = redactor
        .redact(Some(input.text.as_str()), category)
        .expect("built-in matchers never fail");
    let once = first.value.expect("non-null input stays non-null");

    let second = redactor
        .redact(Some(&*once), category)
        .expect("built-in matchers never fail");
    assert_eq!(second.substitutions, 0, "redaction must be idempotent");
    assert_eq!(second.value.as_deref(), Some(&*once));
});
