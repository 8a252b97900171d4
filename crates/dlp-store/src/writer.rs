//! Batched Parquet sink for redacted records.
//!
//! Writes go to a `.parquet.tmp` file next to the final path and are renamed
//! into place only after the Parquet footer is written, so readers never see
//! a partial output file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Float64Builder, Int64Builder, RecordBatch,
    StringBuilder,
};
use arrow::datatypes::{DataType as ArrowType, Schema as ArrowSchema};
use dlp_redact::{FieldValue, Record};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{WriterProperties, WriterVersion};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::schema::unified_schema;
use crate::{RecordSink, SinkReceipt};

/// Configuration for the Parquet sink.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Output directory; created if missing.
    pub base_dir: PathBuf,

    /// Compression codec.
    pub compression: Compression,

    /// Maximum rows per row group.
    pub row_group_size: usize,

    /// Rows per record batch handed to the Parquet writer.
    pub batch_size: usize,

    /// Run ID for file naming.
    pub run_id: String,
}

impl SinkConfig {
    /// Create config with defaults (zstd level 3).
    pub fn new(base_dir: PathBuf, run_id: String) -> Self {
        SinkConfig {
            base_dir,
            compression: Compression::ZSTD(ZstdLevel::try_new(3).unwrap_or_default()),
            row_group_size: 128 * 1024,
            batch_size: crate::DEFAULT_BATCH_SIZE,
            run_id,
        }
    }

    /// Use snappy compression instead of zstd.
    pub fn with_snappy(mut self) -> Self {
        self.compression = Compression::SNAPPY;
        self
    }

    /// Write uncompressed pages.
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    /// Set custom batch size. Zero is treated as one.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set custom row group size. Zero is treated as one.
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Final path of the single output part file.
    pub fn output_path(&self) -> PathBuf {
        self.base_dir
            .join(format!("part-00000-{}.parquet", self.run_id))
    }
}

/// Writes all records of a run into one Parquet file.
#[derive(Debug)]
pub struct ParquetSink {
    config: SinkConfig,
}

impl ParquetSink {
    pub fn new(config: SinkConfig) -> Self {
        ParquetSink { config }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    fn write_file(
        &self,
        temp_path: &Path,
        schema: &Arc<ArrowSchema>,
        records: &[Record],
    ) -> Result<usize> {
        let file = File::create(temp_path)?;

        let props = WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_compression(self.config.compression)
            .set_max_row_group_size(self.config.row_group_size)
            .set_dictionary_enabled(true)
            .build();

        let mut writer = ArrowWriter::try_new(file, Arc::clone(schema), Some(props))?;
        let mut batches = 0;
        for chunk in records.chunks(self.config.batch_size) {
            let batch = build_batch(schema, chunk)?;
            writer.write(&batch)?;
            batches += 1;
        }
        writer.close()?;
        Ok(batches)
    }
}

impl RecordSink for ParquetSink {
    fn write_records(&mut self, records: &[Record]) -> Result<SinkReceipt> {
        if records.is_empty() {
            debug!("no records to write; skipping output file");
            return Ok(SinkReceipt {
                path: None,
                rows: 0,
                batches: 0,
            });
        }

        let schema = unified_schema(records)?;
        if schema.fields().is_empty() {
            return Err(StoreError::Schema("records have no columns".to_string()));
        }

        fs::create_dir_all(&self.config.base_dir)?;
        let output_path = self.config.output_path();
        let temp_path = output_path.with_extension("parquet.tmp");

        let batches = match self.write_file(&temp_path, &schema, records) {
            Ok(batches) => batches,
            Err(e) => {
                // Leave nothing behind that looks like output.
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };
        atomic_rename(&temp_path, &output_path)?;

        debug!(
            path = %output_path.display(),
            rows = records.len(),
            batches,
            "parquet output written"
        );

        Ok(SinkReceipt {
            path: Some(output_path),
            rows: records.len(),
            batches,
        })
    }
}

/// Convert a slice of records into one Arrow batch with `schema`.
///
/// Columns absent from a record's own schema are written as null.
pub fn build_batch(schema: &Arc<ArrowSchema>, records: &[Record]) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| build_column(field.name(), field.data_type(), records))
        .collect::<Result<Vec<ArrayRef>>>()?;
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

static NULL: FieldValue = FieldValue::Null;

fn build_column(name: &str, data_type: &ArrowType, records: &[Record]) -> Result<ArrayRef> {
    let values = records.iter().map(|r| r.get(name).unwrap_or(&NULL));
    let mismatch = |value: &FieldValue| {
        StoreError::Schema(format!(
            "column '{}' expected {} but a record holds {}",
            name,
            data_type,
            value
                .data_type()
                .map(|t| t.as_str())
                .unwrap_or("null")
        ))
    };

    let array: ArrayRef = match data_type {
        ArrowType::Utf8 => {
            let mut builder = StringBuilder::with_capacity(records.len(), 0);
            for value in values {
                match value {
                    FieldValue::Null => builder.append_null(),
                    FieldValue::Text(s) => builder.append_value(s),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ArrowType::Binary => {
            let mut builder = BinaryBuilder::with_capacity(records.len(), 0);
            for value in values {
                match value {
                    FieldValue::Null => builder.append_null(),
                    FieldValue::Binary(b) => builder.append_value(b),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ArrowType::Int64 => {
            let mut builder = Int64Builder::with_capacity(records.len());
            for value in values {
                match value {
                    FieldValue::Null => builder.append_null(),
                    FieldValue::Int64(v) => builder.append_value(*v),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ArrowType::Float64 => {
            let mut builder = Float64Builder::with_capacity(records.len());
            for value in values {
                match value {
                    FieldValue::Null => builder.append_null(),
                    FieldValue::Float64(v) => builder.append_value(*v),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        ArrowType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(records.len());
            for value in values {
                match value {
                    FieldValue::Null => builder.append_null(),
                    FieldValue::Boolean(v) => builder.append_value(*v),
                    other => return Err(mismatch(other)),
                }
            }
            Arc::new(builder.finish())
        }
        other => {
            return Err(StoreError::UnsupportedType {
                column: name.to_string(),
                data_type: other.to_string(),
            })
        }
    };
    Ok(array)
}

/// Helper to rename temp file to final path atomically.
pub fn atomic_rename(temp_path: &Path, final_path: &Path) -> Result<()> {
    fs::rename(temp_path, final_path)?;
    Ok(())
}
