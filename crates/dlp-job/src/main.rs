//! DLP redaction job CLI.
//!
//! Reads a dataset, replaces sensitive substrings in the configured columns
//! with redaction tokens, and writes the result as Parquet. The JSON job
//! summary goes to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use dlp_config::{load_job, JobOverrides, SourceFormat, ValidationError};
use dlp_job::exit_codes::ExitCode;
use dlp_job::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use dlp_job::runner::{build_column_map, build_registry, JobRunner};
use dlp_job::JobError;
use serde::Serialize;
use tracing::error;

/// Batch DLP redaction: mask emails, phone numbers, card numbers and custom
/// patterns in tabular data
#[derive(Parser)]
#[command(name = "dlp-job")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the redaction job and print the job summary
    Run(RunArgs),

    /// Validate the job configuration and patterns without touching data
    Check(ConfigArgs),

    /// List registered categories and their redaction tokens
    Patterns(ConfigArgs),

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Job file (TOML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,

    /// Input dataset (overrides source.path)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Input format (overrides source.format)
    #[arg(long)]
    source_format: Option<SourceFormat>,

    /// Output directory (overrides destination.path)
    #[arg(long)]
    destination: Option<PathBuf>,

    /// Worker count (overrides parallelism)
    #[arg(long)]
    parallelism: Option<usize>,
}

impl RunArgs {
    fn overrides(&self) -> JobOverrides {
        JobOverrides {
            source: self.source.clone(),
            source_format: self.source_format,
            destination: self.destination.clone(),
            parallelism: self.parallelism,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = (cli.global.verbose > 0 || cli.global.quiet)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match cli.command {
        Commands::Run(args) => run_job(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Patterns(args) => run_patterns(&args),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "dlp-job",
                &mut std::io::stdout(),
            );
            ExitCode::Clean
        }
        Commands::Version => {
            print_json(&serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "config_schema_version": dlp_config::CONFIG_SCHEMA_VERSION,
            }));
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_job(args: &RunArgs) -> ExitCode {
    let loaded = match load_job(args.config.config.as_deref(), &args.overrides()) {
        Ok(loaded) => loaded,
        Err(e) => return fail(&JobError::from(e)),
    };

    match JobRunner::new(loaded).run() {
        Ok(summary) => {
            print_json(&summary);
            ExitCode::Clean
        }
        Err(e) => fail(&e),
    }
}

fn run_check(args: &ConfigArgs) -> ExitCode {
    let result = load_job(args.config.as_deref(), &JobOverrides::default())
        .map_err(JobError::from)
        .and_then(|loaded| {
            let registry = build_registry(&loaded.job)?;
            let columns = build_column_map(&loaded.job, &registry)?;
            Ok((loaded, registry, columns))
        });

    match result {
        Ok((loaded, registry, columns)) => {
            print_json(&serde_json::json!({
                "status": "ok",
                "config": loaded.snapshot,
                "categories": registry.categories().collect::<Vec<_>>(),
                "columns": columns,
            }));
            ExitCode::Clean
        }
        Err(e) => fail(&e),
    }
}

#[derive(Serialize)]
struct PatternListing<'a> {
    category: &'a str,
    token: &'a str,
    builtin: bool,
}

fn run_patterns(args: &ConfigArgs) -> ExitCode {
    // Without a job file, list the built-ins only.
    let job = match load_job(args.config.as_deref(), &JobOverrides::default()) {
        Ok(loaded) => loaded.job,
        Err(ValidationError::NotFound) => dlp_config::JobConfig::default(),
        Err(e) => return fail(&JobError::from(e)),
    };
    let registry = match build_registry(&job) {
        Ok(registry) => registry,
        Err(e) => return fail(&e),
    };

    let listing: Vec<_> = registry
        .patterns()
        .iter()
        .map(|p| PatternListing {
            category: p.category(),
            token: p.redaction_token(),
            builtin: dlp_redact::BUILTIN_CATEGORIES.contains(&p.category()),
        })
        .collect();
    print_json(&listing);
    ExitCode::Clean
}

// ============================================================================
// Output helpers
// ============================================================================

fn fail(err: &JobError) -> ExitCode {
    let code = err.exit_code();
    error!(code = code.code_name(), "{}", err);
    eprintln!("dlp-job: {}", err);
    code
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("dlp-job: failed to serialize output: {}", e),
    }
}
