//! DLP job configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the job file (TOML or JSON)
//! - Config resolution (CLI → env → XDG → /etc)
//! - Semantic validation
//! - Config snapshots for the job summary

pub mod job;
pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use job::{
    Compression, DestinationConfig, JobConfig, JobOverrides, PatternConfig, SourceConfig,
    SourceFormat,
};
pub use load::{load_job, LoadedJob};
pub use resolve::{resolve_job_config, ConfigSource, ResolvedPath};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_job, ValidationError, ValidationResult};

/// Schema version for job files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
