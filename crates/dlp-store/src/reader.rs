//! Parquet record source.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::datatypes::{
    DataType as ArrowType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    UInt16Type, UInt32Type, UInt8Type,
};
use dlp_redact::{FieldValue, Record, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::schema::schema_from_arrow;
use crate::RecordSource;

/// Reads every row group of one Parquet file into records.
#[derive(Debug, Clone)]
pub struct ParquetSource {
    path: PathBuf,
    batch_size: usize,
}

impl ParquetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ParquetSource {
            path: path.into(),
            batch_size: crate::DEFAULT_BATCH_SIZE,
        }
    }

    /// Rows per Arrow batch while decoding.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }
}

impl RecordSource for ParquetSource {
    fn read_records(&mut self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(self.batch_size);
        let schema = Arc::new(schema_from_arrow(builder.schema())?);
        let reader = builder.build()?;

        let mut records = Vec::new();
        for batch in reader {
            append_batch(&schema, &batch?, &mut records)?;
        }

        debug!(
            path = %self.path.display(),
            rows = records.len(),
            columns = schema.len(),
            "parquet source read"
        );
        Ok(records)
    }
}

fn append_batch(schema: &Arc<Schema>, batch: &RecordBatch, out: &mut Vec<Record>) -> Result<()> {
    let columns = batch.columns();
    out.reserve(batch.num_rows());
    for row in 0..batch.num_rows() {
        let values = columns
            .iter()
            .zip(schema.fields())
            .map(|(column, field)| value_at(column, row, &field.name))
            .collect::<Result<Vec<_>>>()?;
        out.push(Record::new(Arc::clone(schema), values)?);
    }
    Ok(())
}

/// Extract one cell, widening integers and floats onto the record types.
fn value_at(column: &ArrayRef, row: usize, name: &str) -> Result<FieldValue> {
    if column.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match column.data_type() {
        ArrowType::Utf8 => FieldValue::from(column.as_string::<i32>().value(row)),
        ArrowType::LargeUtf8 => FieldValue::from(column.as_string::<i64>().value(row)),
        ArrowType::Binary => FieldValue::from(column.as_binary::<i32>().value(row).to_vec()),
        ArrowType::LargeBinary => FieldValue::from(column.as_binary::<i64>().value(row).to_vec()),
        ArrowType::Int8 => FieldValue::Int64(column.as_primitive::<Int8Type>().value(row).into()),
        ArrowType::Int16 => FieldValue::Int64(column.as_primitive::<Int16Type>().value(row).into()),
        ArrowType::Int32 => FieldValue::Int64(column.as_primitive::<Int32Type>().value(row).into()),
        ArrowType::Int64 => FieldValue::Int64(column.as_primitive::<Int64Type>().value(row)),
        ArrowType::UInt8 => FieldValue::Int64(column.as_primitive::<UInt8Type>().value(row).into()),
        ArrowType::UInt16 => {
            FieldValue::Int64(column.as_primitive::<UInt16Type>().value(row).into())
        }
        ArrowType::UInt32 => {
            FieldValue::Int64(column.as_primitive::<UInt32Type>().value(row).into())
        }
        ArrowType::Float32 => {
            FieldValue::Float64(column.as_primitive::<Float32Type>().value(row).into())
        }
        ArrowType::Float64 => FieldValue::Float64(column.as_primitive::<Float64Type>().value(row)),
        ArrowType::Boolean => FieldValue::Boolean(column.as_boolean().value(row)),
        other => {
            return Err(StoreError::UnsupportedType {
                column: name.to_string(),
                data_type: other.to_string(),
            })
        }
    };
    Ok(value)
}
