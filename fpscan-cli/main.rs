use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fpscan_cli::fpscan_core::{init_thread_pool, Progress};
use fpscan_cli::{render_overlay, run_scan, AppConfig, CliResult};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Find the closest fingerprint to a sample among the images in a directory
#[derive(Parser, Debug)]
#[command(name = "fpscan", version)]
struct Cli {
    /// Sample fingerprint image
    sample: PathBuf,

    /// Directory of candidate images (not searched recursively)
    dir: PathBuf,

    /// TOML or JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scan at most this many candidates from the sorted listing
    #[arg(long)]
    max_candidates: Option<usize>,

    /// Write the side-by-side match overlay to this PNG
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Print the result as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn render_progress(p: &Progress) {
    let eta = p
        .eta_seconds
        .map(|s| format!("{:.1}s", s))
        .unwrap_or_else(|| "-".to_string());
    eprint!("\r[{}/{}] ETA {}    ", p.processed, p.total, eta);
    let _ = std::io::stderr().flush();
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(max) = cli.max_candidates {
        config.scan.max_candidates = max;
    }
    config.validate()?;
    debug!("{}", config.summary());

    if let Err(e) = init_thread_pool(config.features.n_threads) {
        warn!("thread pool already initialized: {}", e);
    }

    let output = run_scan(&cli.sample, &cli.dir, &config, render_progress)?;
    eprintln!();

    if cli.json {
        println!("{}", output.report.record().to_json()?);
    } else {
        println!("{}", output.report);
    }

    if let Some(path) = &cli.overlay {
        match &output.best {
            Some(best) => {
                render_overlay(&output.sample, best, &config.overlay).save(path)?;
                info!(path = %path.display(), "overlay written");
            }
            None => warn!("no match found, overlay not written"),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "fpscan=debug" } else { "fpscan=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
