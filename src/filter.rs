use std::time::Duration;

use tracing::debug;

use crate::events::ServiceResolver;
use crate::models::{Announcement, ChangeKind, ResolvedService, ServiceKind};

/// Gates raw announcements before classification.
#[derive(Debug, Clone)]
pub struct EventFilter {
    device_filter: Option<String>,
    resolve_attempts: u32,
    resolve_delay: Duration,
}

impl EventFilter {
    pub fn new(device_filter: Option<String>, resolve_attempts: u32, resolve_delay: Duration) -> Self {
        Self {
            device_filter: device_filter.filter(|f| !f.is_empty()),
            resolve_attempts: resolve_attempts.max(1),
            resolve_delay,
        }
    }

    /// Returns the resolved service if the announcement should be classified.
    pub async fn admit<R>(&self, announcement: &Announcement, resolver: &R) -> Option<ResolvedService>
    where
        R: ServiceResolver + ?Sized,
    {
        // Only the RAOP record reflects audio playback.
        if announcement.kind() == ServiceKind::AirPlay {
            return None;
        }
        if announcement.change_kind == ChangeKind::Removed {
            return None;
        }

        let Some(info) = self.resolve_with_retry(announcement, resolver).await else {
            debug!(name = %announcement.name, "Could not get service info, skipping.");
            return None;
        };

        if let Some(device) = &self.device_filter {
            if !info.has_address(device) {
                return None;
            }
        }
        Some(info)
    }

    async fn resolve_with_retry<R>(
        &self,
        announcement: &Announcement,
        resolver: &R,
    ) -> Option<ResolvedService>
    where
        R: ServiceResolver + ?Sized,
    {
        for attempt in 1..=self.resolve_attempts {
            if let Some(info) = resolver
                .resolve(&announcement.service_type, &announcement.name)
                .await
            {
                return Some(info);
            }
            if attempt < self.resolve_attempts {
                tokio::time::sleep(self.resolve_delay).await;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AIRPLAY_SERVICE_TYPE, RAOP_SERVICE_TYPE};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Publishes the record only after `ready_after` lookups.
    struct SlowResolver {
        ready_after: u32,
        calls: AtomicU32,
        info: ResolvedService,
    }

    impl SlowResolver {
        fn new(ready_after: u32, address: &str) -> Self {
            Self {
                ready_after,
                calls: AtomicU32::new(0),
                info: ResolvedService {
                    fullname: "Kitchen._raop._tcp.local.".into(),
                    addresses: vec![address.to_string()],
                    ..Default::default()
                },
            }
        }
    }

    #[async_trait]
    impl ServiceResolver for SlowResolver {
        async fn resolve(&self, _service_type: &str, _name: &str) -> Option<ResolvedService> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            (call > self.ready_after).then(|| self.info.clone())
        }
    }

    fn filter(device: Option<&str>) -> EventFilter {
        EventFilter::new(device.map(String::from), 3, Duration::from_millis(200))
    }

    fn raop(change_kind: ChangeKind) -> Announcement {
        Announcement::new(RAOP_SERVICE_TYPE, "Kitchen._raop._tcp.local.", change_kind)
    }

    #[tokio::test(start_paused = true)]
    async fn airplay_records_never_resolve() {
        let resolver = SlowResolver::new(0, "10.0.0.5");
        let announcement =
            Announcement::new(AIRPLAY_SERVICE_TYPE, "Kitchen._airplay._tcp.local.", ChangeKind::Added);
        assert!(filter(None).admit(&announcement, &resolver).await.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn removals_are_dropped() {
        let resolver = SlowResolver::new(0, "10.0.0.5");
        assert!(filter(None).admit(&raop(ChangeKind::Removed), &resolver).await.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_published() {
        let resolver = SlowResolver::new(2, "10.0.0.5");
        let info = filter(None).admit(&raop(ChangeKind::Added), &resolver).await;
        assert!(info.is_some());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_attempts() {
        let resolver = SlowResolver::new(3, "10.0.0.5");
        let start = tokio::time::Instant::now();
        assert!(filter(None).admit(&raop(ChangeKind::Updated), &resolver).await.is_none());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn device_filter_requires_exact_address() {
        let resolver = SlowResolver::new(0, "10.0.0.50");
        assert!(
            filter(Some("10.0.0.5"))
                .admit(&raop(ChangeKind::Added), &resolver)
                .await
                .is_none()
        );

        let resolver = SlowResolver::new(0, "10.0.0.5");
        assert!(
            filter(Some("10.0.0.5"))
                .admit(&raop(ChangeKind::Added), &resolver)
                .await
                .is_some()
        );
    }

    #[test]
    fn empty_filter_means_none() {
        assert_eq!(filter(Some("")).device_filter, None);
    }
}
