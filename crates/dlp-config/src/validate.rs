//! Configuration validation errors and semantic validation.

use crate::job::JobConfig;
use std::collections::HashSet;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No job configuration found (pass --config, or --source and --destination)")]
    NotFound,

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::NotFound => 62,
            ValidationError::SemanticError(_) => 63,
            ValidationError::MissingField(_) => 64,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate a job configuration semantically.
///
/// Runs after overrides are applied. Pattern syntax and category names are
/// not checked here; the registry rejects those when it is built.
pub fn validate_job(job: &JobConfig) -> ValidationResult<()> {
    if job.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: job.schema_version.clone(),
        });
    }

    if job.job_name.trim().is_empty() {
        return Err(ValidationError::MissingField("job_name".to_string()));
    }

    if job.source.path.as_os_str().is_empty() {
        return Err(ValidationError::MissingField("source.path".to_string()));
    }
    if job.source.resolved_format().is_none() {
        return Err(ValidationError::InvalidValue {
            field: "source.format".to_string(),
            message: format!(
                "cannot infer format from '{}'; set source.format",
                job.source.path.display()
            ),
        });
    }

    if job.destination.path.as_os_str().is_empty() {
        return Err(ValidationError::MissingField("destination.path".to_string()));
    }
    if job.destination.batch_size == 0 {
        return Err(ValidationError::InvalidValue {
            field: "destination.batch_size".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if job.parallelism == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "parallelism".to_string(),
            message: "must be greater than 0".to_string(),
        });
    }

    if let Some(columns) = &job.columns {
        for (column, category) in columns {
            if column.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "columns".to_string(),
                    message: "column name must be non-empty".to_string(),
                });
            }
            if category.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("columns.{}", column),
                    message: "category must be non-empty".to_string(),
                });
            }
        }
    }

    let mut seen = HashSet::new();
    for (i, pattern) in job.patterns.iter().enumerate() {
        for (name, value) in [
            ("category", &pattern.category),
            ("pattern", &pattern.pattern),
            ("token", &pattern.token),
        ] {
            if value.is_empty() {
                return Err(ValidationError::MissingField(format!(
                    "patterns[{}].{}",
                    i, name
                )));
            }
        }
        if !seen.insert(pattern.category.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "custom pattern category '{}' is defined more than once",
                pattern.category
            )));
        }
    }

    Ok(())
}
