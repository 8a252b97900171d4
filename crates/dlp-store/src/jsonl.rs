//! JSON-lines record source.
//!
//! Each non-blank line holds one JSON object. The dataset schema is inferred
//! over all lines before any record is built, so every record shares one
//! schema:
//!
//! - columns appear in first-seen order
//! - integers and floats in one column widen to `Float64`
//! - strings, nested objects and arrays are `Utf8`; nested values are
//!   rendered as JSON text
//! - any other type conflict falls back to `Utf8`, with non-string values
//!   rendered as JSON text
//! - a column that is null everywhere is `Utf8`
//! - a key absent from a line is null in that record

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use dlp_redact::{DataType, Field, FieldValue, Record, Schema};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::RecordSource;

/// Reads a JSON-lines file into records.
#[derive(Debug, Clone)]
pub struct JsonlSource {
    path: PathBuf,
}

impl JsonlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonlSource { path: path.into() }
    }
}

impl RecordSource for JsonlSource {
    fn read_records(&mut self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)?;
        let records = parse_jsonl(BufReader::new(file))?;
        debug!(
            path = %self.path.display(),
            rows = records.len(),
            "jsonl source read"
        );
        Ok(records)
    }
}

/// Inferred kind of a column while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Null,
    Boolean,
    Integer,
    Float,
    Text,
    Mixed,
}

impl ColumnKind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Null => ColumnKind::Null,
            Value::Bool(_) => ColumnKind::Boolean,
            Value::Number(n) if n.is_i64() => ColumnKind::Integer,
            Value::Number(_) => ColumnKind::Float,
            Value::String(_) | Value::Array(_) | Value::Object(_) => ColumnKind::Text,
        }
    }

    fn merge(self, other: Self) -> Self {
        use ColumnKind::*;
        match (self, other) {
            (a, b) if a == b => a,
            (Null, b) => b,
            (a, Null) => a,
            (Integer, Float) | (Float, Integer) => Float,
            _ => Mixed,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Boolean => DataType::Boolean,
            ColumnKind::Integer => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Null | ColumnKind::Text | ColumnKind::Mixed => DataType::Utf8,
        }
    }
}

/// Parse JSON-lines input into records sharing one inferred schema.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut rows: Vec<Map<String, Value>> = Vec::new();
    let mut columns: Vec<(String, ColumnKind)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|e| StoreError::Json {
            line: line_no,
            message: e.to_string(),
        })?;
        let Value::Object(object) = value else {
            return Err(StoreError::Json {
                line: line_no,
                message: "expected a JSON object".to_string(),
            });
        };

        for (key, value) in &object {
            let kind = ColumnKind::of(value);
            match positions.get(key) {
                Some(&pos) => columns[pos].1 = columns[pos].1.merge(kind),
                None => {
                    positions.insert(key.clone(), columns.len());
                    columns.push((key.clone(), kind));
                }
            }
        }
        rows.push(object);
    }

    let kinds: Vec<ColumnKind> = columns.iter().map(|(_, kind)| *kind).collect();
    let schema = Arc::new(Schema::new(
        columns
            .into_iter()
            .map(|(name, kind)| Field::new(name, kind.data_type(), true))
            .collect(),
    )?);

    rows.into_iter()
        .map(|mut row| -> Result<Record> {
            let values = schema
                .fields()
                .iter()
                .zip(&kinds)
                .map(|(field, kind)| convert(row.remove(&field.name), *kind))
                .collect();
            Ok(Record::new(Arc::clone(&schema), values)?)
        })
        .collect()
}

fn convert(value: Option<Value>, kind: ColumnKind) -> FieldValue {
    let value = match value {
        None | Some(Value::Null) => return FieldValue::Null,
        Some(v) => v,
    };
    match (kind, value) {
        (ColumnKind::Boolean, Value::Bool(b)) => FieldValue::Boolean(b),
        (ColumnKind::Integer, Value::Number(n)) => match n.as_i64() {
            Some(i) => FieldValue::Int64(i),
            None => FieldValue::Null,
        },
        (ColumnKind::Float, Value::Number(n)) => match n.as_f64() {
            Some(f) => FieldValue::Float64(f),
            None => FieldValue::Null,
        },
        (_, Value::String(s)) => FieldValue::from(s),
        (_, other) => FieldValue::from(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Vec<Record>> {
        parse_jsonl(input.as_bytes())
    }

    #[test]
    fn test_first_seen_column_order_and_absent_keys() {
        let records = parse(
            r#"{"email": "a@b.com", "name": "Ann"}
{"phone": "555-123-4567"}
"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        let names: Vec<_> = records[0].schema().names().collect();
        assert_eq!(names, vec!["email", "name", "phone"]);
        assert_eq!(records[1].get("email"), Some(&FieldValue::Null));
        assert_eq!(records[1].text("phone"), Some("555-123-4567"));
        assert!(Arc::ptr_eq(records[0].schema(), records[1].schema()));
    }

    #[test]
    fn test_numeric_widening() {
        let records = parse("{\"n\": 1}\n{\"n\": 2.5}\n").unwrap();
        assert_eq!(
            records[0].schema().field("n").unwrap().data_type,
            DataType::Float64
        );
        assert_eq!(records[0].get("n"), Some(&FieldValue::Float64(1.0)));
    }

    #[test]
    fn test_conflicting_types_become_text() {
        let records = parse("{\"v\": \"x\"}\n{\"v\": 7}\n{\"v\": true}\n").unwrap();
        assert_eq!(records[0].schema().field("v").unwrap().data_type, DataType::Utf8);
        assert_eq!(records[0].text("v"), Some("x"));
        assert_eq!(records[1].text("v"), Some("7"));
        assert_eq!(records[2].text("v"), Some("true"));
    }

    #[test]
    fn test_nested_values_rendered_as_json() {
        let records = parse(r#"{"meta": {"k": [1, 2]}}"#).unwrap();
        assert_eq!(records[0].text("meta"), Some(r#"{"k":[1,2]}"#));
    }

    #[test]
    fn test_all_null_column_is_text() {
        let records = parse("{\"x\": null}\n\n{\"x\": null}\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].schema().field("x").unwrap().data_type, DataType::Utf8);
        assert_eq!(records[0].get("x"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse("{\"a\": 1}\n\n{\"a\": \n").unwrap_err();
        match err {
            StoreError::Json { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
        let err = parse("[1, 2]\n").unwrap_err();
        assert!(matches!(err, StoreError::Json { line: 1, .. }));
    }
}
