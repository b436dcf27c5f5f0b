use airplay_watcher::{WatcherConfig, logging};
use anyhow::Result;
use std::env;
use tracing::info;

/// Optional path to a TOML config file; the first CLI argument takes precedence.
const CONFIG_ENV: &str = "AIRPLAY_WATCHER_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging()?;

    let config = match env::args().nth(1).or_else(|| env::var(CONFIG_ENV).ok()) {
        Some(path) => {
            info!("Loading configuration from '{}'...", path);
            WatcherConfig::load(&path)?.with_env_overrides()
        }
        None => WatcherConfig::from_env(),
    };

    info!("Starting AirPlay Watcher...");
    info!("  HA URL: {}", config.ha_url);
    match config.device_filter() {
        Some(device) => info!("  Device IP filter: {}", device),
        None => info!("  Device IP filter: none (watching all AirPlay devices)"),
    }
    info!("  Webhook PLAYING: {}", config.webhook_playing);
    info!("  Webhook IDLE: {}", config.webhook_idle);

    let watcher = airplay_watcher::start(config)?;
    info!("Listening for mDNS updates... (Ctrl+C to stop)");

    tokio::signal::ctrl_c().await?;
    watcher.shutdown().await
}
