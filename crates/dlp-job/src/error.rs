//! Job-level error type and its exit code mapping.

use dlp_config::ValidationError;
use dlp_redact::RedactionError;
use dlp_store::StoreError;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Result type alias for job operations.
pub type Result<T> = std::result::Result<T, JobError>;

/// Any failure that stops a job.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error("redaction error: {0}")]
    Redaction(#[from] RedactionError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl JobError {
    /// Exit code reported to the scheduler.
    ///
    /// Registry and binding errors are detectable before any data is read,
    /// so they count as configuration errors.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            JobError::Config(_) => ExitCode::ConfigError,
            JobError::Redaction(RedactionError::WorkerPanicked(_)) => ExitCode::InternalError,
            JobError::Redaction(e) if e.is_validation() => ExitCode::ConfigError,
            JobError::Redaction(_) => ExitCode::RedactionError,
            JobError::Store(_) => ExitCode::IoError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(
            JobError::from(ValidationError::NotFound).exit_code(),
            ExitCode::ConfigError
        );
        assert_eq!(
            JobError::from(RedactionError::UnknownCategory("ssn".into())).exit_code(),
            ExitCode::ConfigError
        );
        assert_eq!(
            JobError::from(RedactionError::UnsupportedColumnType {
                column: "age".into(),
                record: 3,
                data_type: "int64".into(),
            })
            .exit_code(),
            ExitCode::RedactionError
        );
        assert_eq!(
            JobError::from(RedactionError::WorkerPanicked(1)).exit_code(),
            ExitCode::InternalError
        );
        assert_eq!(
            JobError::from(StoreError::Json {
                line: 4,
                message: "EOF".into()
            })
            .exit_code(),
            ExitCode::IoError
        );
    }
}
