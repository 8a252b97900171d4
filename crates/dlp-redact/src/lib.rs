//! Pattern-based detection and redaction engine for tabular records.
//!
//! This crate is the redaction core of the DLP job: it recognizes sensitive
//! substrings (emails, phone numbers, payment card numbers, and any custom
//! category) inside text columns and substitutes fixed redaction tokens.
//!
//! # Components
//!
//! - **Pattern registry**: categories with a matcher and a redaction token.
//!   Immutable once built; shared across workers without locking.
//! - **Field redactor**: applies one category to one field value.
//! - **Record transformer**: applies the configured column bindings to one record.
//! - **Batch orchestrator**: partitions a dataset, transforms the partitions on
//!   scoped threads, and reduces per-partition statistics into [`RunStatistics`].
//!
//! # Guarantees
//!
//! - **Fail-closed**: a matcher failure or malformed record aborts the whole run.
//!   Errors never carry field content.
//! - **Token-stable**: no registered matcher accepts any registered token, so
//!   a token is never redacted again. This makes the built-in categories
//!   idempotent. A custom pattern whose match can re-form around its own
//!   token (`ab` replaced by `b` turns `aab` into `ab`) is accepted but is not
//!   idempotent.
//! - **Reference-stable**: unmatched values are shared with the input record.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dlp_redact::{BatchOrchestrator, ColumnCategoryMap, PatternRegistry, Record};
//!
//! let registry = Arc::new(PatternRegistry::with_defaults().unwrap());
//! let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();
//! let records = vec![Record::from_text_pairs([("email", Some("a@b.com"))]).unwrap()];
//!
//! let output = BatchOrchestrator::new(registry).run(&records, &columns, 2).unwrap();
//! assert_eq!(output.records[0].text("email"), Some("[EMAIL_REDACTED]"));
//! assert_eq!(output.statistics.by_category["email"], 1);
//! ```

pub mod error;
pub mod orchestrator;
pub mod pattern;
pub mod record;
pub mod redactor;
pub mod registry;
pub mod stats;
pub mod transform;

pub use error::{RedactionError, Result};
pub use orchestrator::{BatchOrchestrator, RunOutput};
pub use pattern::{Matcher, MatcherFailure, RegexMatcher, SensitivePattern, Span};
pub use record::{DataType, Field, FieldValue, Record, Schema};
pub use redactor::{FieldRedactor, Redaction};
pub use registry::PatternRegistry;
pub use stats::{ColumnStatistics, RunStatistics};
pub use transform::{
    ColumnBinding, ColumnCategoryMap, ColumnEvent, RecordTransformer, RedactionOutcome,
};

/// Category names of the built-in patterns, in registration order.
pub const BUILTIN_CATEGORIES: &[&str] = &["email", "phone_number", "credit_card"];
