//! `muon` — Terminal front panel for the Muon hotspot backend.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive state from
//! `muon-core`'s [`Panel`](muon_core::Panel). Screens are navigable via
//! number keys (1-3): Hotspot, WiFi Settings, and Banned.
//!
//! Logs are written to a file to avoid corrupting the terminal UI. A
//! background data bridge task forwards watch-channel changes from the
//! panel into the TUI action loop, and a logind monitor relays
//! suspend/resume to the backend.
//!
//! Entry point: CLI argument parsing, tracing setup, panic hooks, and app launch.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod sleep;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use muon_core::Panel;

use crate::app::App;

/// Terminal front panel for the Muon WiFi hotspot.
#[derive(Parser, Debug)]
#[command(name = "muon", version, about)]
struct Cli {
    /// Bridge base URL (e.g., http://127.0.0.1:8080)
    #[arg(short = 'b', long, env = "MUON_BRIDGE_URL")]
    bridge_url: Option<String>,

    /// Config file path (defaults to the platform config dir)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log file path (defaults to the platform data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. We MUST NOT log to stdout/stderr — that would
/// corrupt the TUI output. Returns a guard that must be held for the
/// lifetime of the application to ensure logs are flushed.
fn setup_tracing(cli: &Cli, config_level: &str) -> Result<WorkerGuard> {
    let log_level = match cli.verbose {
        0 => config_level,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "muon={log_level},muon_core={log_level},muon_api={log_level}"
            ))
        });

    let log_path = match &cli.log_file {
        Some(path) => path.clone(),
        None => muon_config::log_dir().join("muon.log"),
    };
    let log_dir = log_path.parent().unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = log_path
        .file_name()
        .ok_or_else(|| eyre!("log file path has no file name: {}", log_path.display()))?;
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    let mut config = match &cli.config {
        Some(path) => muon_config::load_config_from(path)?,
        None => muon_config::load_config()?,
    };
    if let Some(url) = &cli.bridge_url {
        config.bridge_url.clone_from(url);
    }

    // Tracing to file — hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli, &config.log_level)?;

    info!(bridge_url = %config.bridge_url, "starting muon");

    let panel = Panel::new(config.to_panel_config()?)?;
    let mut app = App::new(panel);
    app.run().await?;

    Ok(())
}
