//! Job file types.
//!
//! A job file names the input dataset, the output location, which columns
//! to redact with which category, and any custom patterns to register on
//! top of the built-ins. Both TOML and JSON are accepted; the format is
//! chosen by file extension.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Schema version for compatibility checking.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Human-readable job name, echoed in logs and the job summary.
    #[serde(default = "default_job_name")]
    pub job_name: String,

    /// Worker count. `None` means one per available CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub destination: DestinationConfig,

    /// Column → category bindings. When absent, every registered category
    /// name is also used as the column name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<BTreeMap<String, String>>,

    /// Custom patterns registered after the built-ins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<PatternConfig>,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_job_name() -> String {
    "dlp-redaction".to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            job_name: default_job_name(),
            parallelism: None,
            source: SourceConfig::default(),
            destination: DestinationConfig::default(),
            columns: None,
            patterns: Vec::new(),
        }
    }
}

/// Input dataset location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub path: PathBuf,

    /// Explicit format. Inferred from the path extension when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<SourceFormat>,
}

impl SourceConfig {
    /// Effective input format: the explicit one, else inferred from the
    /// file extension.
    pub fn resolved_format(&self) -> Option<SourceFormat> {
        self.format.or_else(|| SourceFormat::from_path(&self.path))
    }
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// One JSON object per line.
    Jsonl,
    Parquet,
}

impl SourceFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jsonl" | "ndjson" | "json" => Some(SourceFormat::Jsonl),
            "parquet" | "pq" => Some(SourceFormat::Parquet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Jsonl => "jsonl",
            SourceFormat::Parquet => "parquet",
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(SourceFormat::Jsonl),
            "parquet" => Ok(SourceFormat::Parquet),
            other => Err(ValidationError::InvalidValue {
                field: "source.format".to_string(),
                message: format!("unknown format '{}' (expected jsonl or parquet)", other),
            }),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output location and writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Output directory; created if missing.
    #[serde(default)]
    pub path: PathBuf,

    #[serde(default)]
    pub compression: Compression,

    /// Rows per Parquet record batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    1000
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            compression: Compression::default(),
            batch_size: default_batch_size(),
        }
    }
}

/// Output compression codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Zstd,
    Snappy,
    None,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::Zstd => "zstd",
            Compression::Snappy => "snappy",
            Compression::None => "none",
        }
    }
}

/// A custom pattern registered on top of the built-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub category: String,
    /// Regular expression (regex crate syntax).
    pub pattern: String,
    pub token: String,
}

/// Command-line values that take precedence over the job file.
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    pub source: Option<PathBuf>,
    pub source_format: Option<SourceFormat>,
    pub destination: Option<PathBuf>,
    pub parallelism: Option<usize>,
}

impl JobOverrides {
    /// True when the overrides alone name both ends of the job.
    pub fn is_self_contained(&self) -> bool {
        self.source.is_some() && self.destination.is_some()
    }
}

impl JobConfig {
    /// Load a job file, picking the parser from the extension.
    ///
    /// `.toml` is parsed as TOML; anything else as JSON.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse_for_path(path, &content)
    }

    /// Parse already-read content using the format implied by `path`.
    pub fn parse_for_path(path: &Path, content: &str) -> ValidationResult<Self> {
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);
        if is_toml {
            Self::parse_toml(content)
        } else {
            Self::parse_json(content)
        }
    }

    pub fn parse_json(content: &str) -> ValidationResult<Self> {
        serde_json::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    pub fn parse_toml(content: &str) -> ValidationResult<Self> {
        toml::from_str(content).map_err(|e| ValidationError::ParseError(e.to_string()))
    }

    /// Apply command-line overrides in place.
    pub fn apply_overrides(&mut self, overrides: &JobOverrides) {
        if let Some(source) = &overrides.source {
            self.source.path = source.clone();
            // A new source path invalidates a format chosen for the old one.
            self.source.format = None;
        }
        if let Some(format) = overrides.source_format {
            self.source.format = Some(format);
        }
        if let Some(destination) = &overrides.destination {
            self.destination.path = destination.clone();
        }
        if let Some(parallelism) = overrides.parallelism {
            self.parallelism = Some(parallelism);
        }
    }

    /// Worker count after defaulting to the number of available CPUs.
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
