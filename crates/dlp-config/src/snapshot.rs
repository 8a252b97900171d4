//! Configuration snapshots for the job summary.
//!
//! A snapshot records which job file was used, its content hash, and the
//! effective settings after command-line overrides, so a run's output can
//! be traced back to the exact configuration that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::job::JobConfig;
use crate::resolve::ResolvedPath;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the job file was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the job file.
    pub config_source: String,

    /// SHA-256 hash of the job file content.
    #[serde(default)]
    pub config_hash: Option<String>,

    /// SHA-256 hash of the effective configuration (file plus overrides),
    /// serialized as JSON.
    pub effective_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub job_name: String,
    pub source_path: String,
    #[serde(default)]
    pub source_format: Option<String>,
    pub destination_path: String,
    pub compression: String,
    pub batch_size: usize,
    pub parallelism: usize,

    /// Number of explicit column bindings; `None` when bindings are
    /// derived from category names.
    #[serde(default)]
    pub column_bindings: Option<usize>,

    /// Custom pattern categories, in file order.
    pub custom_categories: Vec<String>,
}

impl ConfigSnapshot {
    /// Create a snapshot of an effective job configuration.
    ///
    /// `content` is the raw job file text, when a file was used.
    pub fn new(job: &JobConfig, resolved: &ResolvedPath, content: Option<&str>) -> Self {
        let effective = serde_json::to_string(job).unwrap_or_default();

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: job.schema_version.clone(),
            config_path: resolved.path.as_ref().map(|p| p.display().to_string()),
            config_source: resolved.source.to_string(),
            config_hash: content.map(hash_content),
            effective_hash: hash_content(&effective),
            summary: ConfigSummary {
                job_name: job.job_name.clone(),
                source_path: job.source.path.display().to_string(),
                source_format: job.source.resolved_format().map(|f| f.to_string()),
                destination_path: job.destination.path.display().to_string(),
                compression: job.destination.compression.as_str().to_string(),
                batch_size: job.destination.batch_size,
                parallelism: job.effective_parallelism(),
                column_bindings: job.columns.as_ref().map(|c| c.len()),
                custom_categories: job.patterns.iter().map(|p| p.category.clone()).collect(),
            },
        }
    }
}

/// Compute SHA-256 hash of content, hex-encoded.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
