//! Tabular record model.
//!
//! A [`Record`] is an immutable row: a shared [`Schema`] plus one
//! [`FieldValue`] per column. Text payloads are reference counted so a
//! transformed record shares every untouched value with its input.

use crate::{RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Declared type of a column at the source boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Utf8,
    Binary,
    Int64,
    Float64,
    Boolean,
}

impl DataType {
    /// Whether values of this type can be scanned for sensitive text.
    pub fn is_text_like(&self) -> bool {
        matches!(self, DataType::Utf8 | DataType::Binary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Utf8 => "utf8",
            DataType::Binary => "binary",
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    /// Nullable UTF-8 column.
    pub fn utf8(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Utf8, true)
    }
}

/// Ordered column list with a name index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema; column names must be unique.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(RedactionError::SchemaError(format!(
                    "duplicate column name '{}'",
                    field.name
                )));
            }
        }
        Ok(Self { fields, index })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(Arc<str>),
    Binary(Arc<[u8]>),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
}

impl FieldValue {
    /// The type of a non-null value.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(_) => Some(DataType::Utf8),
            FieldValue::Binary(_) => Some(DataType::Binary),
            FieldValue::Int64(_) => Some(DataType::Int64),
            FieldValue::Float64(_) => Some(DataType::Float64),
            FieldValue::Boolean(_) => Some(DataType::Boolean),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(&**s),
            _ => None,
        }
    }

    /// Whether both values point at the same heap allocation.
    ///
    /// Scalars and nulls never share; use `==` for content equality.
    pub fn shares_allocation(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Arc::ptr_eq(a, b),
            (FieldValue::Binary(a), FieldValue::Binary(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(Arc::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(Arc::from(value))
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Binary(Arc::from(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int64(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

/// An immutable row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<FieldValue>,
}

impl Record {
    /// Build a record, checking arity, types and nullability against the schema.
    pub fn new(schema: Arc<Schema>, values: Vec<FieldValue>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(RedactionError::SchemaError(format!(
                "record has {} values but schema has {} columns",
                values.len(),
                schema.len()
            )));
        }
        for (field, value) in schema.fields().iter().zip(&values) {
            match value.data_type() {
                None if !field.nullable => {
                    return Err(RedactionError::SchemaError(format!(
                        "null in non-nullable column '{}'",
                        field.name
                    )));
                }
                Some(actual) if actual != field.data_type => {
                    return Err(RedactionError::SchemaError(format!(
                        "column '{}' declared {} but holds {}",
                        field.name, field.data_type, actual
                    )));
                }
                _ => {}
            }
        }
        Ok(Self { schema, values })
    }

    /// Build a record of nullable UTF-8 columns from `(name, value)` pairs.
    pub fn from_text_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let (fields, values): (Vec<_>, Vec<_>) = pairs
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Some(v) => FieldValue::from(v.as_ref()),
                    None => FieldValue::Null,
                };
                (Field::utf8(name), value)
            })
            .unzip();
        Record::new(Arc::new(Schema::new(fields)?), values)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&FieldValue> {
        self.values.get(index)
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.schema.index_of(column).and_then(|i| self.values.get(i))
    }

    /// Text content of a UTF-8 column; `None` for nulls, other types, or absent columns.
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(FieldValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Produce a new record with the value at `index` replaced.
    ///
    /// The replacement is checked against the column's declared type.
    pub fn with_value(&self, index: usize, value: FieldValue) -> Result<Record> {
        let field = self.schema.fields().get(index).ok_or_else(|| {
            RedactionError::SchemaError(format!(
                "column index {} out of range for {} columns",
                index,
                self.schema.len()
            ))
        })?;
        match value.data_type() {
            None if !field.nullable => Err(RedactionError::SchemaError(format!(
                "null in non-nullable column '{}'",
                field.name
            ))),
            Some(actual) if actual != field.data_type => Err(RedactionError::SchemaError(format!(
                "column '{}' declared {} but holds {}",
                field.name, field.data_type, actual
            ))),
            _ => Ok(self.with_replacements(vec![(index, value)])),
        }
    }

    /// Produce a new record with some values replaced; all others are shared.
    ///
    /// Replacements keep the column's declared type, so no re-validation is needed.
    pub(crate) fn with_replacements(&self, replacements: Vec<(usize, FieldValue)>) -> Record {
        let mut values = self.values.clone();
        for (index, value) in replacements {
            values[index] = value;
        }
        Record {
            schema: Arc::clone(&self.schema),
            values,
        }
    }
}
