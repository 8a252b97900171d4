//! Dataset storage for the DLP redaction job.
//!
//! This crate provides:
//! - Record sources: Parquet and JSON lines
//! - A batched Parquet sink with atomic publish
//! - Mapping between record schemas and Arrow schemas

use std::path::PathBuf;

use dlp_redact::Record;
use serde::{Deserialize, Serialize};

pub mod error;
pub mod jsonl;
pub mod reader;
pub mod schema;
pub mod writer;

pub use error::{Result, StoreError};
pub use jsonl::{parse_jsonl, JsonlSource};
pub use reader::ParquetSource;
pub use schema::{from_arrow_type, schema_from_arrow, to_arrow_type, unified_schema};
pub use writer::{ParquetSink, SinkConfig};

/// Default rows per Arrow batch for reads and writes.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Something that yields the full input dataset.
pub trait RecordSource {
    fn read_records(&mut self) -> Result<Vec<Record>>;
}

/// Something that persists a finished, fully redacted dataset.
pub trait RecordSink {
    fn write_records(&mut self, records: &[Record]) -> Result<SinkReceipt>;
}

/// What a sink wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkReceipt {
    /// Output file; `None` when there was nothing to write.
    pub path: Option<PathBuf>,
    pub rows: usize,
    pub batches: usize,
}
