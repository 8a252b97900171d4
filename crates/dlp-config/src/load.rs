//! One-call job loading: resolve, parse, override, validate, snapshot.

use std::path::Path;

use crate::job::{JobConfig, JobOverrides};
use crate::resolve::{resolve_job_config, ResolvedPath};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_job, ValidationError, ValidationResult};

/// A validated job configuration ready to run.
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub job: JobConfig,
    pub resolved: ResolvedPath,
    pub snapshot: ConfigSnapshot,
}

/// Load the effective job configuration.
///
/// When no job file can be found, the overrides must name both a source
/// and a destination; the job then runs with default settings.
pub fn load_job(cli_path: Option<&Path>, overrides: &JobOverrides) -> ValidationResult<LoadedJob> {
    let resolved = resolve_job_config(cli_path);

    let (mut job, content) = match &resolved.path {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            (JobConfig::parse_for_path(path, &content)?, Some(content))
        }
        None if overrides.is_self_contained() => (JobConfig::default(), None),
        None => return Err(ValidationError::NotFound),
    };

    job.apply_overrides(overrides);
    validate_job(&job)?;

    let snapshot = ConfigSnapshot::new(&job, &resolved, content.as_deref());
    Ok(LoadedJob {
        job,
        resolved,
        snapshot,
    })
}
