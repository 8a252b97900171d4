//! Parallel batch redaction.
//!
//! The input is split into contiguous partitions, each transformed on its own
//! scoped thread. Partitions share only the read-only registry and column map.
//! The first failure cancels the remaining workers and is returned; no partial
//! output ever leaves [`BatchOrchestrator::run`].

use crate::stats::StatsAccumulator;
use crate::{
    ColumnCategoryMap, PatternRegistry, Record, RecordTransformer, RedactionError, Result,
    RunStatistics,
};
use chrono::Utc;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use tracing::{debug, error, info, instrument, warn};

/// Transformed dataset and finalized statistics.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Transformed records, in input order.
    pub records: Vec<Record>,
    pub statistics: RunStatistics,
}

/// Output of one partition.
struct PartitionResult {
    records: Vec<Record>,
    stats: StatsAccumulator,
}

/// Fans record transformation out over partitions and reduces the results.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    transformer: RecordTransformer,
}

impl BatchOrchestrator {
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self {
            transformer: RecordTransformer::new(registry),
        }
    }

    pub fn registry(&self) -> &PatternRegistry {
        self.transformer.redactor().registry()
    }

    /// Check the column bindings against the registry.
    pub fn validate(&self, columns: &ColumnCategoryMap) -> Result<()> {
        columns.validate(self.registry())
    }

    /// Redact `records` using up to `parallelism` workers.
    ///
    /// Bindings are validated before any record is touched. Any per-record
    /// failure aborts the whole run.
    #[instrument(
        skip_all,
        fields(records = records.len(), columns = columns.len(), parallelism = parallelism)
    )]
    pub fn run(
        &self,
        records: &[Record],
        columns: &ColumnCategoryMap,
        parallelism: usize,
    ) -> Result<RunOutput> {
        if parallelism == 0 {
            return Err(RedactionError::InvalidParallelism);
        }
        self.validate(columns)?;

        let started_at = Utc::now();
        if records.is_empty() {
            debug!("no records to redact");
            return Ok(RunOutput {
                records: Vec::new(),
                statistics: StatsAccumulator::new(columns).finish(0, started_at),
            });
        }

        let ranges = partition_ranges(records.len(), parallelism);
        let cancelled = AtomicBool::new(false);
        let first_error: OnceLock<RedactionError> = OnceLock::new();

        let partials: Vec<Option<PartitionResult>> = thread::scope(|s| {
            let handles: Vec<_> = ranges
                .iter()
                .enumerate()
                .map(|(partition, range)| {
                    let cancelled = &cancelled;
                    let first_error = &first_error;
                    let chunk = &records[range.clone()];
                    let offset = range.start;
                    s.spawn(move || {
                        self.run_partition(
                            partition,
                            offset,
                            chunk,
                            columns,
                            cancelled,
                            first_error,
                        )
                    })
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(partition, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        error!(partition, "redaction worker panicked");
                        cancelled.store(true, Ordering::Relaxed);
                        let _ = first_error.set(RedactionError::WorkerPanicked(partition));
                        None
                    })
                })
                .collect()
        });

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }

        let partitions = partials.len();
        let mut stats = StatsAccumulator::new(columns);
        let mut output = Vec::with_capacity(records.len());
        for (partition, partial) in partials.into_iter().enumerate() {
            let Some(partial) = partial else {
                return Err(RedactionError::WorkerPanicked(partition));
            };
            stats.merge(partial.stats);
            output.extend(partial.records);
        }

        let statistics = stats.finish(partitions, started_at);
        info!(
            records = statistics.records_processed,
            partitions,
            substitutions = statistics.total_substitutions(),
            skipped_columns = statistics.skipped_columns,
            "redaction run complete"
        );

        Ok(RunOutput {
            records: output,
            statistics,
        })
    }

    fn run_partition(
        &self,
        partition: usize,
        offset: usize,
        chunk: &[Record],
        columns: &ColumnCategoryMap,
        cancelled: &AtomicBool,
        first_error: &OnceLock<RedactionError>,
    ) -> Option<PartitionResult> {
        let mut stats = StatsAccumulator::new(columns);
        let mut records = Vec::with_capacity(chunk.len());

        for (i, record) in chunk.iter().enumerate() {
            if cancelled.load(Ordering::Relaxed) {
                debug!(partition, processed = i, "partition cancelled");
                return None;
            }
            match self.transformer.transform_at(record, columns, offset + i) {
                Ok(outcome) => {
                    stats.observe(&outcome);
                    records.push(outcome.record);
                }
                Err(err) => {
                    cancelled.store(true, Ordering::Relaxed);
                    warn!(partition, record = offset + i, error = %err, "partition failed");
                    let _ = first_error.set(err);
                    return None;
                }
            }
        }

        debug!(partition, offset, records = records.len(), "partition complete");
        Some(PartitionResult { records, stats })
    }
}

/// Split `len` records into `min(parallelism, len)` contiguous ranges.
///
/// Sizes differ by at most one; the first `len % n` ranges take the extra record.
fn partition_ranges(len: usize, parallelism: usize) -> Vec<Range<usize>> {
    let n = parallelism.min(len);
    if n == 0 {
        return Vec::new();
    }
    let base = len / n;
    let extra = len % n;
    let mut start = 0;
    (0..n)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Field, FieldValue, Schema};

    fn orchestrator() -> BatchOrchestrator {
        BatchOrchestrator::new(Arc::new(PatternRegistry::with_defaults().unwrap()))
    }

    fn dataset(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let email = format!("user{i}@example.com");
                let note = format!("row {i}");
                Record::from_text_pairs([("email", Some(email)), ("note", Some(note))]).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();
        let err = orchestrator().run(&dataset(3), &columns, 0).unwrap_err();
        assert_eq!(err, RedactionError::InvalidParallelism);
    }

    #[test]
    fn test_unknown_category_fails_before_processing() {
        let columns = ColumnCategoryMap::from_pairs([("email", "passport")]).unwrap();
        let err = orchestrator().run(&[], &columns, 4).unwrap_err();
        assert_eq!(err, RedactionError::UnknownCategory("passport".into()));
    }

    #[test]
    fn test_preserves_order_and_counts() {
        let records = dataset(10);
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();

        let output = orchestrator().run(&records, &columns, 3).unwrap();

        assert_eq!(output.records.len(), 10);
        for (i, record) in output.records.iter().enumerate() {
            assert_eq!(record.text("email"), Some("[EMAIL_REDACTED]"));
            assert_eq!(record.text("note"), Some(format!("row {i}").as_str()));
        }
        assert_eq!(output.statistics.records_processed, 10);
        assert_eq!(output.statistics.partitions, 3);
        assert_eq!(output.statistics.by_category["email"], 10);
    }

    #[test]
    fn test_partition_ranges_cover_input() {
        for (len, parallelism) in [(5, 4), (6, 4), (7, 6), (10, 3), (1, 8), (9, 9)] {
            let ranges = partition_ranges(len, parallelism);
            assert_eq!(ranges.len(), parallelism.min(len), "len={len} p={parallelism}");
            assert_eq!(ranges.first().map(|r| r.start), Some(0));
            assert_eq!(ranges.last().map(|r| r.end), Some(len));
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
                assert!(pair[0].len() >= pair[1].len());
                assert!(pair[0].len() - pair[1].len() <= 1);
            }
        }
        assert!(partition_ranges(0, 4).is_empty());
    }

    #[test]
    fn test_uses_all_requested_workers() {
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();
        for (len, parallelism) in [(5, 4), (6, 4), (7, 6), (11, 3)] {
            let output = orchestrator().run(&dataset(len), &columns, parallelism).unwrap();
            assert_eq!(output.statistics.partitions, parallelism, "len={len}");
            assert_eq!(output.statistics.records_processed, len as u64);
            for (i, record) in output.records.iter().enumerate() {
                assert_eq!(record.text("note"), Some(format!("row {i}").as_str()));
            }
        }
    }

    #[test]
    fn test_more_workers_than_records() {
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();
        let output = orchestrator().run(&dataset(2), &columns, 16).unwrap();
        assert_eq!(output.statistics.partitions, 2);
        assert_eq!(output.records.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();
        let output = orchestrator().run(&[], &columns, 4).unwrap();
        assert!(output.records.is_empty());
        assert_eq!(output.statistics.by_category["email"], 0);
        assert_eq!(output.statistics.missing_columns().collect::<Vec<_>>(), vec!["email"]);
    }

    #[test]
    fn test_parallelism_does_not_change_result() {
        let records = dataset(37);
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();

        let serial = orchestrator().run(&records, &columns, 1).unwrap();
        let parallel = orchestrator().run(&records, &columns, 8).unwrap();

        assert_eq!(serial.records, parallel.records);
        assert_eq!(serial.statistics.by_category, parallel.statistics.by_category);
        assert_eq!(serial.statistics.by_column, parallel.statistics.by_column);
    }

    #[test]
    fn test_malformed_record_aborts_run() {
        let mut records = dataset(20);
        let schema = Arc::new(
            Schema::new(vec![Field::new("email", crate::DataType::Binary, true)]).unwrap(),
        );
        records[13] = Record::new(schema, vec![FieldValue::from(vec![0xc3, 0x28])]).unwrap();
        let columns = ColumnCategoryMap::from_pairs([("email", "email")]).unwrap();

        let err = orchestrator().run(&records, &columns, 4).unwrap_err();
        match err {
            RedactionError::MatcherExecution { column, record, .. } => {
                assert_eq!(column, "email");
                assert_eq!(record, 13);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
