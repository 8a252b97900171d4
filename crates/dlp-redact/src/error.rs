//! Error types for the redaction engine.
//!
//! No variant ever carries the content of a field: messages name the
//! category, column, and record position only.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while building the registry or redacting records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedactionError {
    /// A category was registered twice.
    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    /// A category was looked up or bound to a column but never registered.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A pattern failed registration checks.
    #[error("invalid pattern for category '{category}': {reason}")]
    InvalidPattern { category: String, reason: String },

    /// A matcher failed on some input. Fatal for the run.
    #[error("matcher for category '{category}' failed on column '{column}' (record {record}): {reason}")]
    MatcherExecution {
        category: String,
        column: String,
        record: usize,
        reason: String,
    },

    /// A configured column holds a value that is not text-like.
    #[error("column '{column}' (record {record}) has type {data_type}, expected utf8 or binary")]
    UnsupportedColumnType {
        column: String,
        record: usize,
        data_type: String,
    },

    /// The same column was bound to more than one category.
    #[error("column '{0}' is bound more than once")]
    DuplicateColumnBinding(String),

    /// A record or schema is structurally invalid.
    #[error("schema error: {0}")]
    SchemaError(String),

    /// The orchestrator was asked to run with zero workers.
    #[error("parallelism must be at least 1")]
    InvalidParallelism,

    /// A worker thread panicked before reporting a result.
    #[error("redaction worker for partition {0} panicked")]
    WorkerPanicked(usize),
}

impl RedactionError {
    /// Whether this error can be detected before any record is processed.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RedactionError::DuplicateCategory(_)
                | RedactionError::UnknownCategory(_)
                | RedactionError::InvalidPattern { .. }
                | RedactionError::DuplicateColumnBinding(_)
                | RedactionError::InvalidParallelism
        )
    }

    /// Attach the record position and column to a matcher failure.
    pub(crate) fn at(self, column: &str, record: usize) -> Self {
        match self {
            RedactionError::MatcherExecution { category, reason, .. } => {
                RedactionError::MatcherExecution {
                    category,
                    column: column.to_string(),
                    record,
                    reason,
                }
            }
            RedactionError::UnsupportedColumnType { data_type, .. } => {
                RedactionError::UnsupportedColumnType {
                    column: column.to_string(),
                    record,
                    data_type,
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(RedactionError::UnknownCategory("ssn".into()).is_validation());
        assert!(RedactionError::InvalidParallelism.is_validation());
        assert!(!RedactionError::WorkerPanicked(0).is_validation());
    }

    #[test]
    fn test_at_fills_position() {
        let err = RedactionError::MatcherExecution {
            category: "email".into(),
            column: String::new(),
            record: 0,
            reason: "invalid UTF-8".into(),
        }
        .at("contact", 41);

        assert_eq!(
            err.to_string(),
            "matcher for category 'email' failed on column 'contact' (record 41): invalid UTF-8"
        );
    }
}
