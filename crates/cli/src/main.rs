mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loudini_core::{load_config_or_default, Config, Shutdown};

use commands::Cli;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "loudini.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging on stderr, keeping stdout for command output
    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = resolve_config(&cli)?;

    // One handle serves the whole run; the first signal cancels the current
    // engine pass and the batch stops there.
    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown requested, stopping after the current pass");
        signal_shutdown.trigger();
    });

    commands::execute(cli, config, &shutdown).await
}

/// Resolves the config from the explicit file, the working directory
/// default, or the built-in defaults, always applying LOUDINI_ environment
/// overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            default_path.exists().then_some(default_path)
        }
    };

    match &path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config_or_default(Some(path))
                .with_context(|| format!("Failed to load config from {:?}", path))
        }
        None => load_config_or_default(None).context("Failed to load config from environment"),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
