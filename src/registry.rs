use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::events::ServiceResolver;
use crate::models::ResolvedService;

/// Cache of resolved services, fed by the mDNS browse loop.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Arc<Mutex<HashMap<String, ResolvedService>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `service`; returns true if it had not been resolved before.
    pub fn upsert(&self, service: ResolvedService) -> bool {
        let mut map = self.services.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(service.fullname.clone(), service).is_none()
    }

    pub fn remove(&self, fullname: &str) -> Option<ResolvedService> {
        self.services
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(fullname)
    }

    pub fn get(&self, fullname: &str) -> Option<ResolvedService> {
        self.services
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(fullname)
            .cloned()
    }
}

#[async_trait]
impl ServiceResolver for ServiceRegistry {
    async fn resolve(&self, _service_type: &str, name: &str) -> Option<ResolvedService> {
        self.get(name)
    }
}
