//! Batch DLP redaction job.
//!
//! Wires the pieces together: resolve and validate the job file
//! ([`dlp_config`]), read the dataset ([`dlp_store`]), redact the configured
//! columns in parallel ([`dlp_redact`]), and publish the result as Parquet.
//!
//! The `dlp-job` binary is a thin CLI over [`runner::JobRunner`].

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod runner;

pub use error::{JobError, Result};
pub use exit_codes::ExitCode;
pub use runner::{JobRunner, JobSummary};
