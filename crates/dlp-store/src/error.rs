//! Error types for record sources and sinks.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from reading or writing datasets.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// A JSON-lines input line could not be parsed. `line` is 1-based.
    #[error("Invalid JSON on line {line}: {message}")]
    Json { line: usize, message: String },

    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Record error: {0}")]
    Record(#[from] dlp_redact::RedactionError),
}
