use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use log::{error, info};

use scanpipe::{
    load_config, logging, run_pass, ConfigError, Database, PipelineConfig, ScanError,
    SqliteCatalog,
};

/// Catalogs scanned journal volumes and publishes them.
#[derive(Parser, Debug)]
#[command(name = "scanpipe")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Reprocess every known volume, resetting all stage flags
    #[arg(long)]
    force: bool,

    /// Override the configured worker count
    #[arg(short, long)]
    workers: Option<usize>,
}

fn run(cli: Cli) -> Result<usize, ScanError> {
    let config = load_config(&cli.config)?;
    logging::init(&config.logging)?;

    info!("Starting scanpipe v{}", env!("CARGO_PKG_VERSION"));

    let database_path = config.database_path().ok_or_else(|| ConfigError::Validation {
        message: "no database path".to_string(),
    })?;
    let database = Database::open(&database_path)?;
    let catalog = Arc::new(SqliteCatalog::new(database));

    let pipeline_config = Arc::new(PipelineConfig::from_config(&config, catalog)?);
    let workers = cli.workers.unwrap_or(config.worker_count);

    let report = run_pass(pipeline_config, workers, cli.force)?;

    info!(
        "{} volumes discovered, {} new, {} updated, {} retried",
        report.scan.discovered,
        report.scan.new.len(),
        report.scan.updated.len(),
        report.retried
    );
    for result in report.results.iter().filter(|r| !r.success) {
        error!(
            "{}: {}",
            result.label,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(report.failed() + report.scan.failed.len())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            error!("{} volumes failed", failures);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("scanpipe: {}", e);
            ExitCode::FAILURE
        }
    }
}
