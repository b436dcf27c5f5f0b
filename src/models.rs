use mdns_sd::ServiceInfo;

use crate::status::TxtProperties;

/// Audio stream record; authoritative for playback state.
pub const RAOP_SERVICE_TYPE: &str = "_raop._tcp.local.";
/// Video/session record; browsed but never used for state.
pub const AIRPLAY_SERVICE_TYPE: &str = "_airplay._tcp.local.";

/// Which of the two browsed records an announcement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Raop,
    AirPlay,
    Other,
}

impl ServiceKind {
    pub fn from_service_type(service_type: &str) -> Self {
        if service_type.contains("_airplay._tcp") {
            ServiceKind::AirPlay
        } else if service_type.contains("_raop._tcp") {
            ServiceKind::Raop
        } else {
            ServiceKind::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Updated,
    Removed,
}

/// One mDNS service event, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub service_type: String,
    pub name: String,
    pub change_kind: ChangeKind,
}

impl Announcement {
    pub fn new(
        service_type: impl Into<String>,
        name: impl Into<String>,
        change_kind: ChangeKind,
    ) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
            change_kind,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        ServiceKind::from_service_type(&self.service_type)
    }
}

/// Resolved service info: addresses plus TXT properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedService {
    pub fullname: String,
    pub addresses: Vec<String>,
    pub properties: TxtProperties,
}

impl ResolvedService {
    pub fn has_address(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }
}

impl From<&ServiceInfo> for ResolvedService {
    fn from(info: &ServiceInfo) -> Self {
        let mut addresses: Vec<String> = info
            .get_addresses()
            .iter()
            .map(|ip| ip.to_string())
            .collect();
        addresses.sort();
        ResolvedService {
            fullname: info.get_fullname().to_string(),
            addresses,
            properties: TxtProperties::from(info.get_properties()),
        }
    }
}
