//! Run-level redaction statistics.
//!
//! Each partition folds its outcomes into a private [`StatsAccumulator`];
//! the orchestrator merges the partials after every worker has joined, so
//! the shared aggregate is never written concurrently.

use crate::transform::{ColumnCategoryMap, ColumnEvent, RedactionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome for one configured column across the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Category bound to the column.
    pub category: String,

    /// Whether at least one record carried the column.
    pub found: bool,

    /// Substitutions made in this column across all records.
    pub substitutions: u64,
}

/// Finalized statistics for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub records_processed: u64,

    /// Number of partitions the input was split into.
    pub partitions: usize,

    /// Substitutions per category; every bound category appears.
    pub by_category: BTreeMap<String, u64>,

    /// Per configured column; every bound column appears.
    pub by_column: BTreeMap<String, ColumnStatistics>,

    /// Configured columns absent from every record.
    pub skipped_columns: usize,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunStatistics {
    /// Configured columns that no record carried.
    pub fn missing_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_column
            .iter()
            .filter(|(_, stats)| !stats.found)
            .map(|(column, _)| column.as_str())
    }

    /// Configured columns present in at least one record.
    pub fn found_columns(&self) -> impl Iterator<Item = (&str, &ColumnStatistics)> + '_ {
        self.by_column
            .iter()
            .filter(|(_, stats)| stats.found)
            .map(|(column, stats)| (column.as_str(), stats))
    }

    pub fn total_substitutions(&self) -> u64 {
        self.by_category.values().sum()
    }

    /// Wall-clock duration of the run in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Partial statistics built privately by one partition.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatsAccumulator {
    records: u64,
    by_category: BTreeMap<String, u64>,
    by_column: BTreeMap<String, ColumnStatistics>,
}

impl StatsAccumulator {
    /// Seed every bound column and category with zero counts.
    pub(crate) fn new(columns: &ColumnCategoryMap) -> Self {
        let mut acc = Self::default();
        for binding in columns {
            acc.by_category.entry(binding.category.clone()).or_insert(0);
            acc.by_column.insert(
                binding.column.clone(),
                ColumnStatistics {
                    category: binding.category.clone(),
                    found: false,
                    substitutions: 0,
                },
            );
        }
        acc
    }

    pub(crate) fn observe(&mut self, outcome: &RedactionOutcome) {
        self.records += 1;
        for (category, count) in &outcome.substitutions {
            *self.by_category.entry(category.clone()).or_insert(0) += *count as u64;
        }
        for event in &outcome.columns {
            if let ColumnEvent::Redacted {
                column,
                category,
                substitutions,
            } = event
            {
                let stats = self
                    .by_column
                    .entry(column.clone())
                    .or_insert_with(|| ColumnStatistics {
                        category: category.clone(),
                        found: false,
                        substitutions: 0,
                    });
                stats.found = true;
                stats.substitutions += *substitutions as u64;
            }
        }
    }

    pub(crate) fn merge(&mut self, other: StatsAccumulator) {
        self.records += other.records;
        for (category, count) in other.by_category {
            *self.by_category.entry(category).or_insert(0) += count;
        }
        for (column, stats) in other.by_column {
            match self.by_column.get_mut(&column) {
                Some(existing) => {
                    existing.found |= stats.found;
                    existing.substitutions += stats.substitutions;
                }
                None => {
                    self.by_column.insert(column, stats);
                }
            }
        }
    }

    pub(crate) fn finish(self, partitions: usize, started_at: DateTime<Utc>) -> RunStatistics {
        let skipped_columns = self.by_column.values().filter(|s| !s.found).count();
        RunStatistics {
            records_processed: self.records,
            partitions,
            by_category: self.by_category,
            by_column: self.by_column,
            skipped_columns,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatternRegistry, Record, RecordTransformer};
    use std::sync::Arc;

    fn outcome(record: Record, columns: &ColumnCategoryMap) -> RedactionOutcome {
        RecordTransformer::new(Arc::new(PatternRegistry::with_defaults().unwrap()))
            .transform(&record, columns)
            .unwrap()
    }

    #[test]
    fn test_seeded_with_zero_counts() {
        let columns =
            ColumnCategoryMap::from_pairs([("email", "email"), ("ssn", "credit_card")]).unwrap();
        let stats = StatsAccumulator::new(&columns).finish(0, Utc::now());

        assert_eq!(stats.by_category["email"], 0);
        assert_eq!(stats.by_category["credit_card"], 0);
        assert_eq!(stats.skipped_columns, 2);
        assert_eq!(stats.records_processed, 0);
    }

    #[test]
    fn test_column_found_if_any_record_has_it() {
        let columns =
            ColumnCategoryMap::from_pairs([("email", "email"), ("phone", "phone_number")]).unwrap();

        let mut left = StatsAccumulator::new(&columns);
        left.observe(&outcome(
            Record::from_text_pairs([("email", Some("a@b.com"))]).unwrap(),
            &columns,
        ));

        let mut right = StatsAccumulator::new(&columns);
        right.observe(&outcome(
            Record::from_text_pairs([("phone", Some("555-123-4567 / 555-987-6543"))]).unwrap(),
            &columns,
        ));

        left.merge(right);
        let stats = left.finish(2, Utc::now());

        assert_eq!(stats.records_processed, 2);
        assert_eq!(stats.by_category["email"], 1);
        assert_eq!(stats.by_category["phone_number"], 2);
        assert!(stats.by_column["email"].found);
        assert!(stats.by_column["phone"].found);
        assert_eq!(stats.by_column["phone"].substitutions, 2);
        assert_eq!(stats.skipped_columns, 0);
        assert_eq!(stats.missing_columns().count(), 0);
        assert_eq!(stats.total_substitutions(), 3);
    }

    #[test]
    fn test_missing_column_reported_once() {
        let columns = ColumnCategoryMap::from_pairs([("ssn", "credit_card")]).unwrap();
        let mut acc = StatsAccumulator::new(&columns);
        for _ in 0..5 {
            acc.observe(&outcome(
                Record::from_text_pairs([("name", Some("Jo"))]).unwrap(),
                &columns,
            ));
        }
        let stats = acc.finish(1, Utc::now());

        assert_eq!(stats.missing_columns().collect::<Vec<_>>(), vec!["ssn"]);
        assert_eq!(stats.skipped_columns, 1);
    }
}
