use std::net::IpAddr;

/// Reduces a user-supplied device filter to a bare host or IP.
///
/// Accepts plain addresses as well as URL-like input such as
/// `http://10.0.0.5:8080/path`. Returns an empty string when nothing usable
/// remains, which callers treat as "no filter".
pub fn normalize_device_address(raw: &str) -> String {
    let value = raw.trim();
    if value.parse::<IpAddr>().is_ok() {
        return value.to_string();
    }

    let value = strip_scheme(value);
    let value = value.split('/').next().unwrap_or_default();

    let value = if value.starts_with('[') {
        // IPv6 literal: keep the brackets, drop any port after them.
        match value.find(']') {
            Some(end) => &value[..=end],
            None => value,
        }
    } else {
        value.split(':').next().unwrap_or_default()
    };

    value.trim().to_string()
}

fn strip_scheme(value: &str) -> &str {
    for scheme in ["http://", "https://"] {
        if let Some(prefix) = value.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &value[scheme.len()..];
            }
        }
    }
    value
}
