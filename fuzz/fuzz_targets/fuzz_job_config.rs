//! Fuzz target for job file parsing.
//!
//! Tests that TOML and JSON job parsing plus semantic validation handle
//! arbitrary input without panicking.

#![no_main]

use dlp_config::{validate_job, JobConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for parsed in [JobConfig::parse_toml(text), JobConfig::parse_json(text)] {
        if let Ok(job) = parsed {
            let _ = validate_job(&job);
            let _ = job.effective_parallelism();
        }
    }
});
