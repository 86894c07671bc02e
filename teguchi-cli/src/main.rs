//! Teguchi CLI — mirror the daily per-broker futures position tables.
//!
//! Takes no arguments: each invocation lists the dates published upstream,
//! fetches every date not yet in `./data`, and writes `<YYYY-MM-DD>.csv`.
//! Optional settings are read from `./teguchi.toml`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use teguchi_core::data::{
    build_client, sync_archive, FormPostProvider, ListingPageSource, StdoutProgress,
};
use teguchi_core::SyncConfig;

#[derive(Parser)]
#[command(
    name = "teguchi",
    version,
    about = "Mirror the daily per-broker futures position tables into ./data"
)]
struct Cli {}

fn main() -> ExitCode {
    let _cli = Cli::parse();

    let (config, working_dir) = match setup() {
        Ok(ready) => ready,
        Err(err) => {
            // Logging is not initialised yet.
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match run_sync(&config, &working_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "sync aborted");
            ExitCode::FAILURE
        }
    }
}

/// Resolve the working directory, load config and start logging.
fn setup() -> Result<(SyncConfig, PathBuf)> {
    let working_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let config = SyncConfig::load_or_default(&working_dir)
        .with_context(|| format!("failed to load config from {}", working_dir.display()))?;
    init_tracing(&config.log_level, &config.log_format)?;
    Ok((config, working_dir))
}

fn run_sync(config: &SyncConfig, working_dir: &Path) -> Result<()> {
    let archive = config.archive(working_dir);
    if archive.ensure_dir().context("failed to prepare data dir")? {
        println!("Data dir doesn't exist. create: {}", archive.dir().display());
    }

    let client = build_client(&config.http_settings())?;
    let source = ListingPageSource::new(client.clone(), config.index_url.clone());
    let provider = FormPostProvider::new(
        client,
        config.data_url.clone(),
        config.document_name.clone(),
    );
    let exporter = config.exporter();
    let throttle = config.throttle();

    tracing::debug!(
        dir = %archive.dir().display(),
        encoding = %exporter.encoding(),
        throttle_ms = config.throttle_ms,
        "starting sync"
    );

    let summary = sync_archive(
        &source,
        &provider,
        &archive,
        &exporter,
        &throttle,
        config.date_order,
        &StdoutProgress,
    )
    .context("sync failed")?;

    tracing::info!(
        discovered = summary.discovered,
        fetched = summary.fetched.len(),
        skipped = summary.skipped.len(),
        "sync finished"
    );
    Ok(())
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let filter = std::env::var("TEGUCHI_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| anyhow::anyhow!("invalid log filter: {err}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if log_format.trim().eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
