mod bootstrap;
mod health;

use anyhow::Result;
use dicey_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use dicey_core::config::LogFormat::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

/// The server takes a single `--config <path>` flag; everything else
/// arrives over the environment. A path given here must exist.
fn load_options() -> LoadOptions {
    let mut options = LoadOptions::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                options.config_path = Some(path.into());
                options.require_file = true;
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            options.config_path = Some(path.into());
            options.require_file = true;
        }
    }
    options
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(load_options())?;
    init_logging(&config);

    // Now bootstrap using the same config we already loaded
    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.host,
        app.config.server.port,
        health::HealthState::new(std::sync::Arc::clone(&app.cache)),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "dicey-server started"
    );

    tokio::select! {
        result = app.gateway_runner.start() => {
            result?;
            tracing::info!(
                event_name = "system.server.gateway_closed",
                correlation_id = "shutdown",
                "gateway stream ended"
            );
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!(
                event_name = "system.shutdown.signal_received",
                correlation_id = "shutdown",
                "shutdown signal received"
            );
        }
    }

    Ok(())
}
