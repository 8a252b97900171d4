//! Job file resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths → /etc.

use std::path::{Path, PathBuf};

/// A discovered job file path and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path to the job file (or None if nothing was found).
    pub path: Option<PathBuf>,

    /// Source of the job file (for diagnostics).
    pub source: ConfigSource,
}

/// Where a job file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/dlp-redact/.
    SystemConfig,

    /// No file; settings come from command-line flags alone.
    #[default]
    CommandLineOnly,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::CommandLineOnly => write!(f, "command line only"),
        }
    }
}

/// Environment variable names.
pub const ENV_JOB_CONFIG: &str = "DLP_JOB_CONFIG";
pub const ENV_CONFIG_DIR: &str = "DLP_CONFIG_DIR";

/// Job file names tried inside a config directory, in order.
const JOB_FILENAMES: &[&str] = &["job.toml", "job.json"];

/// Application name for XDG directories.
const APP_NAME: &str = "dlp-redact";

/// Resolve the job file path.
///
/// Resolution order:
/// 1. Explicit CLI path (always honored, even if it does not exist, so a
///    typo surfaces as a read error rather than silently falling through)
/// 2. `DLP_JOB_CONFIG`
/// 3. `DLP_CONFIG_DIR` + `job.toml` / `job.json`
/// 4. XDG config directory (~/.config/dlp-redact/)
/// 5. System config (/etc/dlp-redact/)
/// 6. Nothing found
pub fn resolve_job_config(cli_path: Option<&Path>) -> ResolvedPath {
    // 1. CLI argument
    if let Some(path) = cli_path {
        return ResolvedPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    // 2. Environment variable (direct path)
    if let Ok(env_path) = std::env::var(ENV_JOB_CONFIG) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    // 3. Environment variable (config dir)
    if let Ok(config_dir) = std::env::var(ENV_CONFIG_DIR) {
        if let Some(path) = find_in_dir(Path::new(&config_dir)) {
            return found(path, ConfigSource::Environment);
        }
    }

    // 4. XDG config directory
    if let Some(dir) = xdg_config_dir() {
        if let Some(path) = find_in_dir(&dir) {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    // 5. System config
    if let Some(path) = find_in_dir(&system_config_dir()) {
        return found(path, ConfigSource::SystemConfig);
    }

    ResolvedPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ResolvedPath {
    ResolvedPath {
        path: Some(path),
        source,
    }
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    JOB_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Get the XDG config directory for dlp-redact.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}
