//! Classification of the vendor `sf` (status flags) TXT field.
//!
//! RAOP receivers publish a hexadecimal or decimal bitfield under `sf`. Bit
//! `0x4` marks an active audio session; bit `0x800` marks standby/group idle
//! and wins over `0x4` on hardware that leaves the session bit set, e.g.
//! `0x404` is playing while `0xc04` is idle.

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

/// TXT key carrying the status flags.
pub const STATUS_FLAGS_KEY: &str = "sf";

/// Active AirPlay/RAOP session.
pub const FLAG_SESSION_ACTIVE: u64 = 0x4;
/// Standby or group idle; overrides [`FLAG_SESSION_ACTIVE`].
pub const FLAG_STANDBY: u64 = 0x800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusFlagsError {
    #[error("status flags are not valid UTF-8")]
    InvalidUtf8,
    #[error("status flags value {raw:?} is not a number")]
    InvalidNumber { raw: String },
}

/// A TXT value as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl PropertyValue {
    pub fn as_text(&self) -> Result<Cow<'_, str>, StatusFlagsError> {
        match self {
            PropertyValue::Text(text) => Ok(Cow::Borrowed(text)),
            PropertyValue::Bytes(bytes) => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| StatusFlagsError::InvalidUtf8),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<&[u8]> for PropertyValue {
    fn from(value: &[u8]) -> Self {
        PropertyValue::Bytes(value.to_vec())
    }
}

/// TXT properties of one service, keyed either by text or by raw bytes.
///
/// Lookups go through [`TxtProperties::get`], which prefers the raw-keyed
/// entry when both forms exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxtProperties {
    text: HashMap<String, PropertyValue>,
    raw: HashMap<Vec<u8>, PropertyValue>,
}

impl TxtProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.text.insert(key.into(), value.into());
    }

    pub fn insert_raw(&mut self, key: impl Into<Vec<u8>>, value: impl Into<PropertyValue>) {
        self.raw.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.raw
            .get(key.as_bytes())
            .or_else(|| self.text.get(key))
    }

    /// Lossy `key=value` rendering for logs.
    pub fn to_display_pairs(&self) -> Vec<String> {
        let render = |value: &PropertyValue| match value {
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        };
        let mut pairs: Vec<String> = self
            .raw
            .iter()
            .map(|(k, v)| format!("{}={}", String::from_utf8_lossy(k), render(v)))
            .chain(self.text.iter().map(|(k, v)| format!("{}={}", k, render(v))))
            .collect();
        pairs.sort();
        pairs
    }
}

impl From<&mdns_sd::TxtProperties> for TxtProperties {
    fn from(props: &mdns_sd::TxtProperties) -> Self {
        let mut out = TxtProperties::new();
        for prop in props.iter() {
            out.insert_raw(prop.key().as_bytes(), prop.val().unwrap_or_default());
        }
        out
    }
}

/// Parses an `sf` value: `0x`/`0X` prefixed hex, otherwise signed decimal.
///
/// Values wider than 64 bits keep their low 64 bits and negative decimals wrap
/// to two's complement, so the flag bits read the same as in the full value.
pub fn parse_status_flags(value: &PropertyValue) -> Result<u64, StatusFlagsError> {
    let text = value.as_text()?;
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => low_bits(hex, 16),
        None => match trimmed.strip_prefix('-') {
            Some(digits) => low_bits(digits, 10).map(u64::wrapping_neg),
            None => low_bits(trimmed.strip_prefix('+').unwrap_or(trimmed), 10),
        },
    };
    parsed.ok_or_else(|| StatusFlagsError::InvalidNumber {
        raw: trimmed.to_string(),
    })
}

/// Value of `digits` modulo 2^64; `None` on an empty or non-digit string.
fn low_bits(digits: &str, radix: u32) -> Option<u64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0u64, |acc, c| {
        let digit = c.to_digit(radix)?;
        Some(acc.wrapping_mul(u64::from(radix)).wrapping_add(u64::from(digit)))
    })
}

/// Bit classification of a parsed `sf` value.
pub fn flags_indicate_streaming(flags: u64) -> bool {
    flags & FLAG_SESSION_ACTIVE != 0 && flags & FLAG_STANDBY == 0
}

/// Returns true if the properties describe an actively streaming receiver.
///
/// A missing or unparseable `sf` field counts as idle.
pub fn is_streaming(properties: &TxtProperties) -> bool {
    let Some(value) = properties.get(STATUS_FLAGS_KEY) else {
        return false;
    };
    match parse_status_flags(value) {
        Ok(flags) => {
            info!("  sf raw: {:?} -> parsed: {:#x}", value.as_text().unwrap_or_default(), flags);
            flags_indicate_streaming(flags)
        }
        Err(e) => {
            debug!("Ignoring status flags: {}", e);
            false
        }
    }
}
