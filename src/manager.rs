use crate::config::WatcherConfig;
use crate::events::{ServiceResolver, WebhookClient};
use crate::filter::EventFilter;
use crate::models::{AIRPLAY_SERVICE_TYPE, Announcement, ChangeKind, RAOP_SERVICE_TYPE, ResolvedService};
use crate::notifier::{Delivery, HttpWebhookClient, Notifier};
use crate::registry::ServiceRegistry;
use crate::status::is_streaming;
use crate::tracker::{Action, PlaybackState, TransitionTracker};

use anyhow::{Context, Result};
use futures::stream::StreamExt;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Service types browsed by the watcher.
pub const BROWSED_SERVICE_TYPES: [&str; 2] = [RAOP_SERVICE_TYPE, AIRPLAY_SERVICE_TYPE];

/// Filter, classify, track and notify for a single announcement.
///
/// The tracker lock is held across the webhook call so webhooks go out in
/// the same order as the transitions that caused them. The call is bounded
/// by the HTTP client timeout.
pub struct StateWatcher {
    filter: EventFilter,
    resolver: Arc<dyn ServiceResolver>,
    tracker: Mutex<TransitionTracker>,
    notifier: Notifier,
}

impl StateWatcher {
    pub fn new(
        config: &WatcherConfig,
        resolver: Arc<dyn ServiceResolver>,
        webhooks: Arc<dyn WebhookClient>,
    ) -> Self {
        Self {
            filter: EventFilter::new(
                config.device_filter(),
                config.resolve_attempts,
                config.resolve_delay(),
            ),
            resolver,
            tracker: Mutex::new(TransitionTracker::new()),
            notifier: Notifier::new(config, webhooks),
        }
    }

    /// Processes one announcement; returns the delivery if a webhook was due.
    pub async fn handle(&self, announcement: &Announcement) -> Option<Delivery> {
        let info = self
            .filter
            .admit(announcement, self.resolver.as_ref())
            .await?;
        self.apply(&info).await
    }

    async fn apply(&self, info: &ResolvedService) -> Option<Delivery> {
        info!("Service update: {}", info.fullname);
        info!("  Address: {:?}", info.addresses);
        info!("  Properties: {:?}", info.properties.to_display_pairs());

        let state = PlaybackState::from_streaming(is_streaming(&info.properties));

        let mut tracker = self.tracker.lock().await;
        let action = tracker.observe(state);
        let Some(target) = action.target() else {
            info!("  State unchanged ({}), skipping webhook.", state);
            return None;
        };

        if action == Action::FireInitialPlaying {
            info!("  -> Already playing at startup: {}", target);
        } else {
            info!("  -> State changed to: {}", target);
        }
        Some(self.notifier.notify(target).await)
    }

    pub async fn current_state(&self) -> Option<PlaybackState> {
        self.tracker.lock().await.last_state()
    }
}

/// Browses the AirPlay service types and feeds announcements to a [`StateWatcher`].
pub struct ServiceManager {
    mdns: ServiceDaemon,
    registry: ServiceRegistry,
    watcher: Arc<StateWatcher>,
}

impl ServiceManager {
    /// Creates a manager with an mDNS daemon and a reqwest webhook client.
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        let webhooks = HttpWebhookClient::new(config.webhook_timeout())?;
        let mdns = ServiceDaemon::new().context("start mDNS daemon")?;
        Ok(Self::with_parts(config, mdns, Arc::new(webhooks)))
    }

    pub fn with_parts(
        config: &WatcherConfig,
        mdns: ServiceDaemon,
        webhooks: Arc<dyn WebhookClient>,
    ) -> Self {
        let registry = ServiceRegistry::new();
        let watcher = Arc::new(StateWatcher::new(
            config,
            Arc::new(registry.clone()),
            webhooks,
        ));
        Self {
            mdns,
            registry,
            watcher,
        }
    }

    pub fn watcher(&self) -> Arc<StateWatcher> {
        Arc::clone(&self.watcher)
    }

    /// Runs the browse loop until the daemon stops delivering events.
    pub async fn run(&self) -> Result<()> {
        let mut streams = Vec::new();
        for service_type in BROWSED_SERVICE_TYPES {
            let receiver = self
                .mdns
                .browse(service_type)
                .with_context(|| format!("browse for {}", service_type))?;
            streams.push(receiver.into_stream());
            info!("Browsing for '{}'...", service_type);
        }

        let mut merged_stream = futures::stream::select_all(streams);

        while let Some(service_event) = merged_stream.next().await {
            if let Some(announcement) = self.announcement_for(service_event) {
                self.dispatch(announcement);
            }
        }
        Ok(())
    }

    /// Handles `announcement` on its own task so a pending resolve retry
    /// never holds up the rest.
    fn dispatch(&self, announcement: Announcement) -> JoinHandle<Option<Delivery>> {
        let watcher = Arc::clone(&self.watcher);
        tokio::spawn(async move { watcher.handle(&announcement).await })
    }

    /// Updates the registry and maps a daemon event to an announcement.
    fn announcement_for(&self, event: ServiceEvent) -> Option<Announcement> {
        match event {
            ServiceEvent::ServiceFound(service_type, fullname) => {
                debug!("Found: {}", fullname);
                Some(Announcement::new(service_type, fullname, ChangeKind::Added))
            }
            ServiceEvent::ServiceResolved(info) => {
                let resolved = ResolvedService::from(&info);
                debug!("Resolved: {}", resolved.fullname);
                let change_kind = if self.registry.upsert(resolved) {
                    ChangeKind::Added
                } else {
                    ChangeKind::Updated
                };
                Some(Announcement::new(
                    info.get_type(),
                    info.get_fullname(),
                    change_kind,
                ))
            }
            ServiceEvent::ServiceRemoved(service_type, fullname) => {
                debug!("Removed: {}", fullname);
                self.registry.remove(&fullname);
                Some(Announcement::new(service_type, fullname, ChangeKind::Removed))
            }
            _ => None,
        }
    }

    /// Stops browsing and releases the mDNS daemon.
    pub fn shutdown(&self) {
        for service_type in BROWSED_SERVICE_TYPES {
            if let Err(e) = self.mdns.stop_browse(service_type) {
                debug!("stop_browse({}) failed: {}", service_type, e);
            }
        }
        if let Err(e) = self.mdns.shutdown() {
            warn!("Failed to shut down mDNS daemon: {}", e);
        }
    }
}
