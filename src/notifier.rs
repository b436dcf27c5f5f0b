use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::WatcherConfig;
use crate::events::{WebhookClient, WebhookError};
use crate::tracker::PlaybackState;

/// `WebhookClient` backed by a shared `reqwest::Client` with a request timeout.
#[derive(Debug, Clone)]
pub struct HttpWebhookClient {
    client: reqwest::Client,
}

impl HttpWebhookClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .build()
            .context("build webhook HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookClient for HttpWebhookClient {
    async fn post(&self, url: &str) -> Result<u16, WebhookError> {
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| WebhookError::Transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

/// Result of one notification attempt. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No webhook id configured for the state.
    Skipped,
    Delivered { url: String, status: u16 },
    Failed { url: String, reason: String },
}

/// Maps playback states to Home Assistant webhook URLs and fires them.
#[derive(Clone)]
pub struct Notifier {
    base_url: String,
    playing_path: String,
    idle_path: String,
    client: Arc<dyn WebhookClient>,
}

impl Notifier {
    pub fn new(config: &WatcherConfig, client: Arc<dyn WebhookClient>) -> Self {
        Self {
            base_url: config.ha_url.trim_end_matches('/').to_string(),
            playing_path: config.webhook_playing.clone(),
            idle_path: config.webhook_idle.clone(),
            client,
        }
    }

    /// `{ha_url}/api/webhook/{path}` for `state`, or `None` if its path is unset.
    pub fn webhook_url(&self, state: PlaybackState) -> Option<String> {
        let path = match state {
            PlaybackState::Playing => &self.playing_path,
            PlaybackState::Idle => &self.idle_path,
        };
        let path = path.trim().trim_start_matches('/');
        (!path.is_empty()).then(|| format!("{}/api/webhook/{}", self.base_url, path))
    }

    pub async fn notify(&self, state: PlaybackState) -> Delivery {
        let Some(url) = self.webhook_url(state) else {
            warn!(%state, "Webhook URL not configured, skipping.");
            return Delivery::Skipped;
        };

        match self.client.post(&url).await {
            Ok(status) => {
                info!(%url, status, "Webhook called");
                Delivery::Delivered { url, status }
            }
            Err(e) => {
                error!(%url, "Webhook call failed: {}", e);
                Delivery::Failed {
                    url,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct Unreachable;

    #[async_trait]
    impl WebhookClient for Unreachable {
        async fn post(&self, _url: &str) -> Result<u16, WebhookError> {
            Err(WebhookError::Transport("connection refused".into()))
        }
    }

    fn config(base: &str) -> WatcherConfig {
        WatcherConfig {
            ha_url: base.to_string(),
            webhook_playing: "airplay_on".into(),
            webhook_idle: String::new(),
            ..Default::default()
        }
    }

    #[test]
    fn builds_webhook_urls() {
        let notifier = Notifier::new(&config("http://ha.local:8123/"), Arc::new(Unreachable));
        assert_eq!(
            notifier.webhook_url(PlaybackState::Playing).as_deref(),
            Some("http://ha.local:8123/api/webhook/airplay_on")
        );
        assert_eq!(notifier.webhook_url(PlaybackState::Idle), None);
    }

    #[tokio::test]
    async fn missing_path_is_skipped() {
        let notifier = Notifier::new(&config("http://ha.local:8123"), Arc::new(Unreachable));
        assert_eq!(notifier.notify(PlaybackState::Idle).await, Delivery::Skipped);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_raised() {
        let notifier = Notifier::new(&config("http://ha.local:8123"), Arc::new(Unreachable));
        let delivery = notifier.notify(PlaybackState::Playing).await;
        assert!(matches!(delivery, Delivery::Failed { reason, .. } if reason.contains("refused")));
    }

    #[tokio::test]
    async fn posts_to_http_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let client = HttpWebhookClient::new(Duration::from_secs(5)).unwrap();
        let notifier = Notifier::new(&config(&format!("http://{}", addr)), Arc::new(client));
        let delivery = notifier.notify(PlaybackState::Playing).await;

        assert_eq!(
            delivery,
            Delivery::Delivered {
                url: format!("http://{}/api/webhook/airplay_on", addr),
                status: 200,
            }
        );
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/webhook/airplay_on HTTP/1.1"));
    }

    #[tokio::test]
    async fn hanging_endpoint_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = HttpWebhookClient::new(Duration::from_millis(200)).unwrap();
        let notifier = Notifier::new(&config(&format!("http://{}", addr)), Arc::new(client));
        let delivery = notifier.notify(PlaybackState::Playing).await;
        assert!(matches!(delivery, Delivery::Failed { .. }));
    }
}
