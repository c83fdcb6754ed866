//! CLI definition, tracing setup, and console reporting.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use feedbundle_core::merger::{BundleReport, SourceFailure};
use feedbundle_core::pipeline::{
    self, BundleFailure, ProgressReporter, RunFailure, RunOptions, RunReport,
};
use feedbundle_core::validator::ValidationOutcome;
use feedbundle_shared::{BundleSpec, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// feedbundle: validate OPML feed lists and build merged bundles.
#[derive(Parser, Debug)]
#[command(
    name = "feedbundle",
    version,
    about = "Validate OPML feed lists and merge them into bundles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Only validate the input documents; do not build bundles.
    #[arg(long)]
    pub validate_only: bool,

    /// Only build bundles; skip validation.
    #[arg(long)]
    pub build_only: bool,

    /// Repository root holding the input documents.
    #[arg(long, default_value = ".", env = "FEEDBUNDLE_ROOT")]
    pub root: PathBuf,

    /// Project config file (defaults to <root>/feedbundle.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

impl Cli {
    /// Phases to run. Each `--*-only` flag disables the other phase, so
    /// passing both runs nothing.
    pub(crate) fn run_options(&self) -> RunOptions {
        RunOptions {
            validate: !self.build_only,
            build: !self.validate_only,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "feedbundle=info",
        1 => "feedbundle=debug",
        _ => "feedbundle=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the requested phases and map the report to a process exit status.
pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.root, cli.config.as_deref())
        .wrap_err("failed to load project configuration")?;
    let options = cli.run_options();

    info!(
        root = %config.root.display(),
        validate = options.validate,
        build = options.build,
        "starting run"
    );

    let rule = "=".repeat(60);
    println!("{rule}");
    println!("OPML Bundle Builder and Validator");
    println!("{rule}");

    let report = pipeline::run(&config, &options, &CliProgress)?;

    if report.is_success() {
        println!();
        println!("{rule}");
        println!("✓ Process completed successfully!");
        println!("{rule}");
    }

    Ok(ExitCode::from(report.exit_code()))
}

// ---------------------------------------------------------------------------
// Console progress
// ---------------------------------------------------------------------------

/// Prints run progress to stdout.
struct CliProgress;

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        println!();
        println!("{name}...");
    }

    fn document_validated(&self, outcome: &ValidationOutcome) {
        if outcome.is_valid {
            println!(
                "✓ {}: Valid OPML with {} feeds",
                outcome.display_name(),
                outcome.feed_count
            );
        } else {
            println!("✗ {}: {}", outcome.display_name(), outcome.reason);
        }
    }

    fn validation_passed(&self, count: usize) {
        println!();
        println!("✓ All {count} OPML files are valid!");
    }

    fn bundle_started(&self, spec: &BundleSpec) {
        println!();
        println!("Building bundle: {}", spec.name);
        println!("   Output: {}", spec.output);
        println!("   Sources: {} files", spec.sources.len());
    }

    fn source_missing(&self, source: &str) {
        println!("   ⚠ Warning: Source file not found: {source}");
    }

    fn source_failed(&self, failure: &SourceFailure) {
        println!(
            "   ⚠ Warning: Failed to process {}: {}",
            failure.source, failure.error
        );
    }

    fn bundle_built(&self, report: &BundleReport) {
        println!("   ✓ Created with {} feeds", report.feed_count);
    }

    fn bundle_failed(&self, failure: &BundleFailure) {
        println!(
            "   ✗ Failed to build bundle {}: {}",
            failure.spec_path.display(),
            failure.error
        );
    }

    fn done(&self, report: &RunReport) {
        match &report.failure {
            None if !report.built.is_empty() => {
                println!();
                println!("✓ All bundles built successfully!");
                println!("   Output directory: {}", report.output_dir.display());
            }
            None => {}
            Some(RunFailure::ValidationFailed { .. }) => {
                println!();
                println!("✗ Validation failed. Please fix the errors above.");
            }
            Some(RunFailure::BundlesFailed { .. }) => {
                println!();
                println!("✗ Some bundles failed to build");
            }
            Some(failure) => println!("✗ {failure}"),
        }
    }
}
