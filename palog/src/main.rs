use anyhow::Context;
use palog::{Config, create_monitor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; otherwise debug builds log at DEBUG
    #[cfg(debug_assertions)]
    let log_level = "debug";
    #[cfg(not(debug_assertions))]
    let log_level = "info";

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting palog...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e).context("failed to load configuration");
        }
    };
    tracing::info!(
        "Configuration: endpoint={}, interval={:?}, timeout={:?}, romanize={}, timezone={}, max_players={}",
        config.rcon_endpoint,
        config.interval,
        config.timeout,
        config.romanize,
        config.timezone,
        config.max_players
    );

    let mut monitor = create_monitor(&config);

    tokio::select! {
        _ = monitor.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
