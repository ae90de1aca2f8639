//! foldersync - periodic one-way folder synchronization.
//!
//! Usage:
//!   foldersync --source DIR --replica DIR --log-file FILE [--interval SECS]
//!
//! The replica is made to match the source immediately, then again every
//! interval, until the process receives Ctrl-C (or SIGTERM on Unix).

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{bail, eyre, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::Level;

use foldersync_core::{SyncConfig, SyncError, DEFAULT_CHUNK_SIZE};
use foldersync_sync::{Scheduler, SyncLogger, TracingLogger};

#[derive(Parser)]
#[command(
    name = "foldersync",
    version,
    about = "Keep a replica folder in one-way sync with a source folder",
    long_about = "foldersync periodically makes a replica directory tree match a source tree.\n\n\
                  New and changed files are copied, files missing from the source are \
                  removed from the replica, and every action is written to the log file."
)]
struct Cli {
    /// Root of the authoritative tree
    #[arg(long)]
    source: PathBuf,

    /// Root of the tree to keep in sync with the source
    #[arg(long)]
    replica: PathBuf,

    /// File to append log lines to
    #[arg(long)]
    log_file: PathBuf,

    /// Seconds to wait between synchronization cycles
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Read size in bytes used when hashing files
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Always hash files, even when their sizes already differ
    #[arg(long)]
    no_size_check: bool,

    /// Exit with an error instead of retrying when the source root disappears
    #[arg(long)]
    exit_on_structural_error: bool,

    /// Log per-file detail (unchanged files, skipped entries)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_logging(&cli.log_file, cli.verbose)?;

    eprintln!(
        "Synchronizing {} -> {} every {}s (log: {})",
        config.source.display(),
        config.replica.display(),
        cli.interval,
        cli.log_file.display()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run(config))
}

/// Validate arguments and resolve both roots to absolute paths.
fn build_config(cli: &Cli) -> Result<SyncConfig> {
    let source = cli
        .source
        .canonicalize()
        .with_context(|| format!("Invalid source path: {}", cli.source.display()))?;
    if !source.is_dir() {
        bail!("Source is not a directory: {}", source.display());
    }

    let replica = if cli.replica.exists() {
        cli.replica.canonicalize()
    } else {
        std::path::absolute(&cli.replica)
    }
    .with_context(|| format!("Invalid replica path: {}", cli.replica.display()))?;

    let config = SyncConfig::builder()
        .source(source)
        .replica(replica)
        .interval(Duration::from_secs(cli.interval))
        .chunk_size(cli.chunk_size)
        .compare_sizes_first(!cli.no_size_check)
        .exit_on_structural_error(cli.exit_on_structural_error)
        .build()
        .map_err(|e| SyncError::invalid_config(e.to_string()))?;

    Ok(config)
}

/// Send timestamped, leveled log lines to the log file.
fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .try_init()
        .map_err(|e| eyre!("Failed to initialize logging: {e}"))?;

    Ok(())
}

async fn run(config: SyncConfig) -> Result<()> {
    let logger: Arc<dyn SyncLogger> = Arc::new(TracingLogger);

    logger.info("Starting folder synchronization service.");
    logger.info(&format!("Source: {}", config.source.display()));
    logger.info(&format!("Replica: {}", config.replica.display()));
    logger.info(&format!("Interval: {} seconds", config.interval.as_secs()));

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(&config, Arc::clone(&logger));

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => signal_cancel.cancel(),
            Err(e) => tracing::error!("Failed to listen for interrupt signal: {e}"),
        }
    });

    match scheduler.run(cancel).await {
        Ok(summary) => {
            logger.info(&format!(
                "Stopped after {} cycles ({} failed, {} entry failures).",
                summary.cycles, summary.failed_cycles, summary.entry_failures
            ));
            Ok(())
        }
        Err(err) => {
            logger.error(&format!("Stopping on unrecoverable error: {err}"));
            Err(err).context("Synchronization stopped")
        }
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
