//! Job runner: source → orchestrator → sink.
//!
//! The registry and column bindings are built and validated before the
//! source is opened, so configuration mistakes never cost a dataset read.
//! The sink is only invoked after the whole dataset was redacted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dlp_config::{
    Compression, ConfigSnapshot, JobConfig, LoadedJob, SourceFormat, ValidationError,
};
use dlp_redact::{BatchOrchestrator, ColumnCategoryMap, PatternRegistry, RunStatistics};
use dlp_store::{
    JsonlSource, ParquetSink, ParquetSource, RecordSink, RecordSource, SinkConfig, SinkReceipt,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::logging::generate_run_id;

/// Machine-readable result of one job run, printed to stdout.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub run_id: String,
    pub job_name: String,
    pub source: String,
    pub source_format: String,
    pub parallelism: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub statistics: RunStatistics,
    pub output: SinkReceipt,
}

/// Build the registry: built-in patterns, then the job's custom patterns
/// in file order.
pub fn build_registry(job: &JobConfig) -> Result<PatternRegistry> {
    let mut registry = PatternRegistry::with_defaults()?;
    for custom in &job.patterns {
        registry.register_regex(custom.category.as_str(), &custom.pattern, custom.token.as_str())?;
    }
    Ok(registry)
}

/// Column bindings from the job file, or one column per category name when
/// the file gives none.
pub fn build_column_map(job: &JobConfig, registry: &PatternRegistry) -> Result<ColumnCategoryMap> {
    let columns = match &job.columns {
        Some(columns) => ColumnCategoryMap::try_from(columns.clone())?,
        None => ColumnCategoryMap::by_category_name(registry),
    };
    columns.validate(registry)?;
    Ok(columns)
}

/// Open the configured input.
pub fn open_source(job: &JobConfig) -> Result<Box<dyn RecordSource>> {
    let path = job.source.path.clone();
    match job.source.resolved_format() {
        Some(SourceFormat::Jsonl) => Ok(Box::new(JsonlSource::new(path))),
        Some(SourceFormat::Parquet) => Ok(Box::new(ParquetSource::new(path))),
        None => Err(ValidationError::InvalidValue {
            field: "source.format".to_string(),
            message: format!("cannot infer format from '{}'", path.display()),
        }
        .into()),
    }
}

/// Sink settings for the configured destination.
pub fn sink_config(job: &JobConfig, run_id: &str) -> SinkConfig {
    let config = SinkConfig::new(job.destination.path.clone(), run_id.to_string())
        .with_batch_size(job.destination.batch_size);
    match job.destination.compression {
        Compression::Zstd => config,
        Compression::Snappy => config.with_snappy(),
        Compression::None => config.uncompressed(),
    }
}

/// Runs one configured job.
#[derive(Debug, Clone)]
pub struct JobRunner {
    loaded: LoadedJob,
    run_id: String,
}

impl JobRunner {
    pub fn new(loaded: LoadedJob) -> Self {
        Self {
            loaded,
            run_id: generate_run_id(),
        }
    }

    /// Use a fixed run ID; it names the output part file.
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn job(&self) -> &JobConfig {
        &self.loaded.job
    }

    #[instrument(skip_all, fields(run_id = %self.run_id, job = %self.loaded.job.job_name))]
    pub fn run(&self) -> Result<JobSummary> {
        let started_at = Utc::now();
        let job = &self.loaded.job;

        let registry = Arc::new(build_registry(job)?);
        let columns = build_column_map(job, &registry)?;
        let parallelism = job.effective_parallelism();
        let orchestrator = BatchOrchestrator::new(Arc::clone(&registry));

        info!(
            source = %job.source.path.display(),
            categories = registry.len(),
            columns = columns.len(),
            parallelism,
            "starting redaction job"
        );

        let records = open_source(job)?.read_records()?;
        info!(records = records.len(), "source loaded");

        let output = orchestrator.run(&records, &columns, parallelism)?;
        drop(records);

        let mut sink = ParquetSink::new(sink_config(job, &self.run_id));
        let receipt = sink.write_records(&output.records)?;

        log_statistics(&output.statistics, &receipt);

        Ok(JobSummary {
            run_id: self.run_id.clone(),
            job_name: job.job_name.clone(),
            source: job.source.path.display().to_string(),
            source_format: job
                .source
                .resolved_format()
                .map(|f| f.to_string())
                .unwrap_or_default(),
            parallelism,
            started_at,
            finished_at: Utc::now(),
            config: self.loaded.snapshot.clone(),
            statistics: output.statistics,
            output: receipt,
        })
    }
}

/// Per-column job-end report.
pub fn log_statistics(statistics: &RunStatistics, receipt: &SinkReceipt) {
    for (column, stats) in statistics.found_columns() {
        info!(
            column,
            category = %stats.category,
            substitutions = stats.substitutions,
            "redacted column"
        );
    }
    for column in statistics.missing_columns() {
        warn!(column, "column not found; skipping redaction");
    }
    match &receipt.path {
        Some(path) => info!(
            path = %path.display(),
            rows = receipt.rows,
            substitutions = statistics.total_substitutions(),
            duration_ms = statistics.duration_ms(),
            "redacted data written"
        ),
        None => warn!("source was empty; no output written"),
    }
}
