use crate::models::ResolvedService;
use async_trait::async_trait;
use thiserror::Error;

/// Resolves full service info for a discovered service.
///
/// Implemented by the mDNS registry in production and by in-memory maps in
/// tests.
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    /// Returns the addresses and TXT properties of `name`, or `None` if the
    /// record has not been published yet.
    async fn resolve(&self, service_type: &str, name: &str) -> Option<ResolvedService>;
}

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Transport(String),
}

/// Outbound HTTP capability used by the notifier.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Sends a bodyless POST to `url` and returns the HTTP status code.
    async fn post(&self, url: &str) -> Result<u16, WebhookError>;
}
