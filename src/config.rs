use anyhow::{Context, Result};
use serde::Deserialize;
use std::{io::Read, path::Path, time::Duration};

use crate::address::normalize_device_address;

pub const DEFAULT_HA_URL: &str = "http://homeassistant.local:8123";

/// Watcher settings: defaults, then an optional TOML file, then environment.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    /// Base URL of the Home Assistant instance receiving webhooks.
    pub ha_url: String,
    /// Webhook id fired when playback starts.
    pub webhook_playing: String,
    /// Webhook id fired when playback stops.
    pub webhook_idle: String,
    /// Raw device filter; see [`WatcherConfig::device_filter`].
    pub device_ip: String,
    pub webhook_timeout_secs: u64,
    pub resolve_attempts: u32,
    pub resolve_delay_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            ha_url: DEFAULT_HA_URL.to_string(),
            webhook_playing: String::new(),
            webhook_idle: String::new(),
            device_ip: String::new(),
            webhook_timeout_secs: 5,
            resolve_attempts: 3,
            resolve_delay_ms: 200,
        }
    }
}

impl WatcherConfig {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read config from {:?}", path.as_ref()))?;
        toml::from_str(&content).context("parse watcher config")
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut buf = String::new();
        let mut rdr = reader;
        rdr.read_to_string(&mut buf)?;
        toml::from_str(&buf).context("parse watcher config from reader")
    }

    /// Defaults overridden by `HA_URL`, `WEBHOOK_PLAYING`, `WEBHOOK_IDLE` and `DEVICE_IP`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (key, field) in [
            ("HA_URL", &mut self.ha_url),
            ("WEBHOOK_PLAYING", &mut self.webhook_playing),
            ("WEBHOOK_IDLE", &mut self.webhook_idle),
            ("DEVICE_IP", &mut self.device_ip),
        ] {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }
        self
    }

    /// Normalized device address, or `None` when watching every receiver.
    pub fn device_filter(&self) -> Option<String> {
        let normalized = normalize_device_address(&self.device_ip);
        (!normalized.is_empty()).then_some(normalized)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }

    pub fn resolve_delay(&self) -> Duration {
        Duration::from_millis(self.resolve_delay_ms)
    }
}
