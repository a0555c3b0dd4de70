//! Scenario replay entry point.
//!
//! Usage: `harvest-cli <scenario.json> [output-dir]`
//!
//! Replays one timestep of harvest damage through the reporter and writes the
//! event log, summary log and maps. Output locations default to
//! [`ReportingConfig::from_env`]; a second argument overrides the output dir.
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use reporting::{ReportError, ReportingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use scenario::Scenario;

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut args = std::env::args_os().skip(1);
    let Some(scenario_path) = args.next().map(PathBuf::from) else {
        bail!("usage: harvest-cli <scenario.json> [output-dir]");
    };

    let mut config = ReportingConfig::from_env();
    if let Some(output_dir) = args.next() {
        config.output_dir = PathBuf::from(output_dir);
    }

    let _guard = setup_logging()?;

    let scenario = Scenario::load(&scenario_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;
    let summary = scenario.run(config).inspect_err(|err| {
        if let Some(report) = err.downcast_ref::<ReportError>() {
            tracing::error!(severity = report.severity().as_str(), "{report}");
        }
    })?;

    tracing::info!(
        units = summary.units,
        stands = summary.stands,
        summaries = summary.summaries,
        "timestep {} reported",
        summary.time
    );
    Ok(())
}

/// Setup logging to both stderr and a per-run log file.
fn setup_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "harvest-cli.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::info!("Log file: {}/harvest-cli.log", log_dir.display());

    Ok(guard)
}

/// Platform-specific log directory, e.g. `~/.cache/harvest/logs` on Linux.
fn log_directory() -> PathBuf {
    directories::ProjectDirs::from("", "", "harvest")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/harvest"))
        .join("logs")
}
