//! dysy-gen: concolic regression-test generator
//!
//! # Usage
//!
//! ```bash
//! # Generate tests for the first function of subject.py within 30 seconds
//! cargo run --bin dysy-gen --release -- subject.py out/ 30
//!
//! # Reproducible run with a YAML config and a JSON report
//! cargo run --bin dysy-gen -- subject.py out/ 30 --config dysy.yaml --seed 7 --report json
//! ```

use clap::{Parser, ValueEnum};
use dysy_core::config::{Preset, SessionConfig};
use dysy_core::{run_session, ConcolicDriver, ProgramAnalyzer, UnittestWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Seconds held back from the timeout for writing the test file
const SHUTDOWN_MARGIN_SECS: u64 = 2;

#[derive(Parser)]
#[command(name = "dysy-gen")]
#[command(about = "Generate unittest regression tests by concolic execution", long_about = None)]
struct Cli {
    /// Python file whose first function is tested
    subject: PathBuf,

    /// Directory receiving Test_<module>_Test.py
    output_dir: PathBuf,

    /// Total run time in seconds
    timeout_secs: u64,

    /// YAML session configuration (version 1)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Configuration preset (ignored when --config is given)
    #[arg(long)]
    preset: Option<Preset>,

    /// RNG seed for reproducible sessions
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Print a session report on stdout
    #[arg(long, value_enum)]
    report: Option<ReportFormat>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    let module = module_name(&cli.subject)?;
    std::fs::create_dir_all(&cli.output_dir)?;

    let analysis = ProgramAnalyzer::new()?.analyze_file(&cli.subject)?;
    let mut driver = ConcolicDriver::new(&analysis, module.as_str(), &config);
    let (mut writer, path) = UnittestWriter::create(&cli.output_dir, &module)?;

    let budget = Duration::from_secs(config.time_budget_secs.saturating_sub(SHUTDOWN_MARGIN_SECS));
    let report = run_session(&mut driver, &mut writer, budget);
    writer.finish()?;
    tracing::info!(path = %path.display(), "Wrote test module");

    println!("ADDED - {}", report.added);
    println!("SKIPPED - {}", report.skipped);

    if let Some(ReportFormat::Json) = cli.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Config file or preset, then command-line overrides
fn load_config(cli: &Cli) -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let mut config = match (&cli.config, cli.preset) {
        (Some(path), _) => SessionConfig::from_yaml(path)?,
        (None, Some(preset)) => SessionConfig::preset(preset),
        (None, None) => SessionConfig::default(),
    };
    config.time_budget_secs = cli.timeout_secs;
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.max_iterations.is_some() {
        config.max_iterations = cli.max_iterations;
    }
    config.validate()?;
    Ok(config)
}

fn module_name(subject: &Path) -> Result<String, Box<dyn std::error::Error>> {
    subject
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| format!("cannot derive a module name from {}", subject.display()).into())
}
