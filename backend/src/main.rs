use anyhow::{Context, Result};
use std::path::PathBuf;
use wiki_backend::config::WikiConfig;
use wiki_backend::infrastructure::observability::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LogFormat::from_env());

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WIKI_CONFIG").ok())
        .map(PathBuf::from);
    let config =
        WikiConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    tracing::info!("Starting wiki with config: {:?}", config);

    let wiki = wiki_backend::start(&config)
        .await
        .context("Wiki failed to start")?;

    wiki.run_until(shutdown_signal())
        .await
        .context("HTTP server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for Ctrl-C, running until killed: {}", e);
        std::future::pending::<()>().await;
    }
}
