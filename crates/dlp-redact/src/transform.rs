//! Record-level transformation.
//!
//! Binds columns to categories and applies the field redactor to every bound
//! column of a record. Columns never read each other's redacted values, so
//! the binding order has no effect on the output record.

use crate::record::{FieldValue, Record};
use crate::{FieldRedactor, PatternRegistry, RedactionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One `column → category` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub column: String,
    pub category: String,
}

/// Ordered bindings from column names to sensitive-data categories.
///
/// Each column is bound to at most one category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct ColumnCategoryMap {
    bindings: Vec<ColumnBinding>,
}

impl ColumnCategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `column` to `category`; a column may only be bound once.
    pub fn bind(&mut self, column: impl Into<String>, category: impl Into<String>) -> Result<()> {
        let column = column.into();
        if self.bindings.iter().any(|b| b.column == column) {
            return Err(RedactionError::DuplicateColumnBinding(column));
        }
        self.bindings.push(ColumnBinding {
            column,
            category: category.into(),
        });
        Ok(())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::new();
        for (column, category) in pairs {
            map.bind(column, category)?;
        }
        Ok(map)
    }

    /// Bind every registered category to the column of the same name.
    pub fn by_category_name(registry: &PatternRegistry) -> Self {
        Self {
            bindings: registry
                .categories()
                .map(|c| ColumnBinding {
                    column: c.to_string(),
                    category: c.to_string(),
                })
                .collect(),
        }
    }

    /// Check that every bound category is registered.
    pub fn validate(&self, registry: &PatternRegistry) -> Result<()> {
        for binding in &self.bindings {
            registry.lookup(&binding.category)?;
        }
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnBinding> {
        self.bindings.iter()
    }

    /// Distinct bound categories in first-bound order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for binding in &self.bindings {
            if !seen.contains(&binding.category.as_str()) {
                seen.push(binding.category.as_str());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'a> IntoIterator for &'a ColumnCategoryMap {
    type Item = &'a ColumnBinding;
    type IntoIter = std::slice::Iter<'a, ColumnBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

impl TryFrom<BTreeMap<String, String>> for ColumnCategoryMap {
    type Error = RedactionError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

impl From<ColumnCategoryMap> for BTreeMap<String, String> {
    fn from(map: ColumnCategoryMap) -> Self {
        map.bindings
            .into_iter()
            .map(|b| (b.column, b.category))
            .collect()
    }
}

/// What happened to one bound column of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ColumnEvent {
    /// The column exists; `substitutions` matches were replaced (possibly zero).
    Redacted {
        column: String,
        category: String,
        substitutions: usize,
    },
    /// The column is absent from the record's schema.
    Missing { column: String, category: String },
}

impl ColumnEvent {
    pub fn column(&self) -> &str {
        match self {
            ColumnEvent::Redacted { column, .. } | ColumnEvent::Missing { column, .. } => column,
        }
    }
}

/// Transformed record plus per-record counts.
#[derive(Debug, Clone, PartialEq)]
pub struct RedactionOutcome {
    pub record: Record,

    /// Substitutions per category, for every category whose column was found.
    pub substitutions: BTreeMap<String, usize>,

    /// One event per binding, in binding order.
    pub columns: Vec<ColumnEvent>,
}

impl RedactionOutcome {
    pub fn missing_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().filter_map(|e| match e {
            ColumnEvent::Missing { column, .. } => Some(column.as_str()),
            ColumnEvent::Redacted { .. } => None,
        })
    }

    pub fn total_substitutions(&self) -> usize {
        self.substitutions.values().sum()
    }
}

/// Applies column bindings to records. Stateless; safe to share between threads.
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    redactor: FieldRedactor,
}

impl RecordTransformer {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self {
            redactor: FieldRedactor::new(registry),
        }
    }

    pub fn redactor(&self) -> &FieldRedactor {
        &self.redactor
    }

    /// Redact the bound columns of `record`; the input is never modified.
    pub fn transform(
        &self,
        record: &Record,
        columns: &ColumnCategoryMap,
    ) -> Result<RedactionOutcome> {
        self.transform_at(record, columns, 0)
    }

    /// Like [`transform`](Self::transform), tagging errors with the record's position.
    pub(crate) fn transform_at(
        &self,
        record: &Record,
        columns: &ColumnCategoryMap,
        position: usize,
    ) -> Result<RedactionOutcome> {
        let schema = record.schema();
        let mut replacements: Vec<(usize, FieldValue)> = Vec::new();
        let mut substitutions = BTreeMap::new();
        let mut events = Vec::with_capacity(columns.len());

        for binding in columns {
            let Some(index) = schema.index_of(&binding.column) else {
                events.push(ColumnEvent::Missing {
                    column: binding.column.clone(),
                    category: binding.category.clone(),
                });
                continue;
            };

            let field = &schema.fields()[index];
            if !field.data_type.is_text_like() {
                return Err(RedactionError::UnsupportedColumnType {
                    column: binding.column.clone(),
                    record: position,
                    data_type: field.data_type.to_string(),
                });
            }

            let (value, count) = self
                .redactor
                .redact_value(&record.values()[index], &binding.category)
                .map_err(|e| e.at(&binding.column, position))?;

            if count > 0 {
                replacements.push((index, value));
            }
            *substitutions.entry(binding.category.clone()).or_insert(0) += count;
            events.push(ColumnEvent::Redacted {
                column: binding.column.clone(),
                category: binding.category.clone(),
                substitutions: count,
            });
        }

        let record = if replacements.is_empty() {
            record.clone()
        } else {
            record.with_replacements(replacements)
        };

        Ok(RedactionOutcome {
            record,
            substitutions,
            columns: events,
        })
    }
}
