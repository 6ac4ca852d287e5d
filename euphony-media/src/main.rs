//! euphony-media server binary

use anyhow::{Context, Result};
use clap::Parser;
use euphony_media::{config::MediaConfig, handlers, observability, state::MediaState};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "euphony-media")]
#[command(version)]
#[command(about = "Media storage and range streaming service", long_about = None)]
struct Cli {
    /// Configuration file to load instead of the standard locations
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli
        .config
        .map_or_else(MediaConfig::load, MediaConfig::load_from)
        .context("Failed to load configuration")?;

    observability::init()?;

    let addr = config.server.bind_address();
    let state = MediaState::local(config)
        .await
        .context("Failed to prepare the upload directories")?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "Media service listening");

    axum::serve(listener, handlers::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Media service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal");
        std::future::pending::<()>().await;
    }
}
