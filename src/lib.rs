//! # AirPlay Watcher: playback webhooks from mDNS announcements
//!
//! This library watches `_raop._tcp` / `_airplay._tcp` announcements on the local
//! network, works out whether an AirPlay receiver is currently streaming audio,
//! and calls a Home Assistant webhook whenever that changes.
//!
//! ## Key Concepts
//!
//! - **`WatcherConfig`**: webhook ids, Home Assistant base URL and an optional
//!   device filter. Loaded from a TOML file and/or the `HA_URL`,
//!   `WEBHOOK_PLAYING`, `WEBHOOK_IDLE` and `DEVICE_IP` environment variables.
//!
//! - **Status flags**: RAOP receivers publish a bitfield under the `sf` TXT key.
//!   Bit `0x4` set and bit `0x800` clear means audio is streaming.
//!
//! - **`TransitionTracker`**: turns repeated, noisy announcements into edges.
//!   A watcher started while the receiver is already playing fires the playing
//!   webhook once; one started while idle stays quiet until the next change.
//!
//! - **`WatcherHandle`**: returned by [`start`]; reports the current state and
//!   shuts the mDNS daemon down.
//!
//! ## Quickstart Example
//!
//! ```no_run
//! use airplay_watcher::WatcherConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     airplay_watcher::logging::init_logging()?;
//!
//!     let config = WatcherConfig::from_env();
//!     let watcher = airplay_watcher::start(config)?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     watcher.shutdown().await
//! }
//! ```

pub mod address;
pub mod client;
pub mod config;
pub mod events;
pub mod filter;
pub mod logging;
pub mod manager;
pub mod models;
pub mod notifier;
pub mod registry;
pub mod status;
pub mod tracker;

// Re-export public-facing components.
pub use address::normalize_device_address;
pub use client::WatcherHandle;
pub use config::WatcherConfig;
pub use events::{ServiceResolver, WebhookClient, WebhookError};
pub use filter::EventFilter;
pub use manager::{ServiceManager, StateWatcher};
pub use models::{Announcement, ChangeKind, ResolvedService, ServiceKind};
pub use notifier::{Delivery, HttpWebhookClient, Notifier};
pub use status::{PropertyValue, StatusFlagsError, TxtProperties, is_streaming};
pub use tracker::{Action, PlaybackState, TransitionTracker};

use anyhow::Result;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Starts browsing in a background task.
///
/// Must be called from within a tokio runtime.
pub fn start(config: WatcherConfig) -> Result<WatcherHandle> {
    let manager = ServiceManager::new(&config)?;
    let watcher = manager.watcher();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let result = tokio::select! {
            result = manager.run() => result,
            _ = shutdown_rx => Ok(()),
        };
        if let Err(e) = &result {
            error!("Watcher loop failed: {:#}", e);
        }
        manager.shutdown();
        info!("Stopped.");
        result
    });

    Ok(WatcherHandle {
        watcher,
        shutdown_tx,
        task,
    })
}
