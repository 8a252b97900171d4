//! Mapping between record schemas and Arrow schemas.
//!
//! Records carry one of five logical types. On the way in, Arrow's wider
//! family of types is folded onto those five (all integers to `Int64`, all
//! floats to `Float64`, large variants to their regular ones). On the way
//! out, every column is written nullable so records with different schemas
//! can share one file.

use std::sync::Arc;

use arrow::datatypes::{DataType as ArrowType, Field as ArrowField, Schema as ArrowSchema};
use dlp_redact::{DataType, Field, Record, Schema};

use crate::error::{Result, StoreError};

/// Arrow type used to store a record type.
pub fn to_arrow_type(data_type: DataType) -> ArrowType {
    match data_type {
        DataType::Utf8 => ArrowType::Utf8,
        DataType::Binary => ArrowType::Binary,
        DataType::Int64 => ArrowType::Int64,
        DataType::Float64 => ArrowType::Float64,
        DataType::Boolean => ArrowType::Boolean,
    }
}

/// Record type an Arrow column is read as, if supported.
pub fn from_arrow_type(data_type: &ArrowType) -> Option<DataType> {
    match data_type {
        ArrowType::Utf8 | ArrowType::LargeUtf8 => Some(DataType::Utf8),
        ArrowType::Binary | ArrowType::LargeBinary => Some(DataType::Binary),
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32 => Some(DataType::Int64),
        ArrowType::Float32 | ArrowType::Float64 => Some(DataType::Float64),
        ArrowType::Boolean => Some(DataType::Boolean),
        _ => None,
    }
}

/// Convert an Arrow schema read from a file into a record schema.
pub fn schema_from_arrow(schema: &ArrowSchema) -> Result<Schema> {
    let fields = schema
        .fields()
        .iter()
        .map(|field| {
            let data_type =
                from_arrow_type(field.data_type()).ok_or_else(|| StoreError::UnsupportedType {
                    column: field.name().clone(),
                    data_type: field.data_type().to_string(),
                })?;
            Ok(Field::new(field.name().clone(), data_type, field.is_nullable()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Schema::new(fields)?)
}

/// Build one nullable Arrow schema covering every column of `records`.
///
/// Columns appear in first-seen order. A column declared with different
/// types in different records is an error.
pub fn unified_schema(records: &[Record]) -> Result<Arc<ArrowSchema>> {
    let mut fields: Vec<(String, DataType)> = Vec::new();
    let mut last: Option<&Arc<Schema>> = None;

    for record in records {
        // Most datasets share one schema Arc; skip re-scanning it.
        if last.is_some_and(|s| Arc::ptr_eq(s, record.schema())) {
            continue;
        }
        last = Some(record.schema());

        for field in record.schema().fields() {
            match fields.iter().find(|(name, _)| *name == field.name) {
                Some((_, existing)) if *existing != field.data_type => {
                    return Err(StoreError::Schema(format!(
                        "column '{}' is {} in one record and {} in another",
                        field.name, existing, field.data_type
                    )));
                }
                Some(_) => {}
                None => fields.push((field.name.clone(), field.data_type)),
            }
        }
    }

    Ok(Arc::new(ArrowSchema::new(
        fields
            .into_iter()
            .map(|(name, data_type)| ArrowField::new(name, to_arrow_type(data_type), true))
            .collect::<Vec<_>>(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlp_redact::FieldValue;

    #[test]
    fn test_integer_family_folds_to_int64() {
        for t in [ArrowType::Int8, ArrowType::UInt32, ArrowType::Int64] {
            assert_eq!(from_arrow_type(&t), Some(DataType::Int64));
        }
        assert_eq!(from_arrow_type(&ArrowType::UInt64), None);
        assert_eq!(from_arrow_type(&ArrowType::LargeUtf8), Some(DataType::Utf8));
        assert_eq!(from_arrow_type(&ArrowType::Date32), None);
    }

    #[test]
    fn test_schema_from_arrow_rejects_unsupported() {
        let arrow = ArrowSchema::new(vec![
            ArrowField::new("email", ArrowType::Utf8, true),
            ArrowField::new("born", ArrowType::Date32, true),
        ]);
        let err = schema_from_arrow(&arrow).unwrap_err();
        match err {
            StoreError::UnsupportedType { column, .. } => assert_eq!(column, "born"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unified_schema_first_seen_order() {
        let a = Record::from_text_pairs([("email", Some("x")), ("name", Some("y"))]).unwrap();
        let b = Record::from_text_pairs([("phone", Some("1")), ("email", None::<&str>)]).unwrap();
        let schema = unified_schema(&[a, b]).unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["email", "name", "phone"]);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
    }

    #[test]
    fn test_unified_schema_type_conflict() {
        let a = Record::from_text_pairs([("id", Some("x"))]).unwrap();
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]).unwrap());
        let b = Record::new(schema, vec![FieldValue::Int64(1)]).unwrap();
        assert!(matches!(
            unified_schema(&[a, b]),
            Err(StoreError::Schema(_))
        ));
    }
}
