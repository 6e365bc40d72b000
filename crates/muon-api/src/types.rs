//! Wire types exchanged with the backend bridge.

use serde::{Deserialize, Serialize};

// ── Devices ─────────────────────────────────────────────────────────

/// One station associated with the hotspot.
///
/// The backend merges hostapd station data with dnsmasq leases, so a
/// freshly associated device may briefly carry no lease (`ip` /
/// `hostname` null). Those rows are filtered out at the facade boundary
/// — see [`parse_device_list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub mac: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Signed dBm-ish value; the backend normalizes positives to negative.
    #[serde(default)]
    pub signal_strength: Option<i32>,
}

impl DeviceRecord {
    /// A record is displayable once both the lease fields are present.
    pub fn has_lease(&self) -> bool {
        self.ip.as_deref().is_some_and(|s| !s.is_empty())
            && self.hostname.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Decode a device-list payload defensively.
///
/// The backend has shipped three shapes over its lifetime: a JSON array,
/// a JSON-string-encoded array, and (on internal failure) an object like
/// `{"error": "..."}`. Anything that isn't ultimately an array of
/// records coerces to an empty list — the panel must never throw over a
/// bad poll.
pub fn parse_device_list(payload: &serde_json::Value) -> Vec<DeviceRecord> {
    let decoded: serde_json::Value = match payload {
        serde_json::Value::String(s) => match serde_json::from_str(s) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "device list was not valid JSON; treating as empty");
                return Vec::new();
            }
        },
        other => other.clone(),
    };

    match serde_json::from_value::<Vec<DeviceRecord>>(decoded) {
        Ok(records) => records.into_iter().filter(DeviceRecord::has_lease).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "device list payload was not an array; treating as empty");
            Vec::new()
        }
    }
}

// ── Dependencies ────────────────────────────────────────────────────

/// Presence of the two packages the hotspot needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub dnsmasq: bool,
    pub hostapd: bool,
}

impl DependencyStatus {
    pub fn satisfied(self) -> bool {
        self.dnsmasq && self.hostapd
    }
}

/// Normalize the polymorphic `check_dependencies` payload.
///
/// Old backends returned a single bool (everything-or-nothing); current
/// ones return a name-keyed map. Either way the caller gets the typed
/// pair. Unknown shapes default to "satisfied" so a decoding quirk never
/// locks the panel behind the install gate.
pub fn normalize_dependency_status(payload: &serde_json::Value) -> DependencyStatus {
    match payload {
        serde_json::Value::Bool(ok) => DependencyStatus {
            dnsmasq: *ok,
            hostapd: *ok,
        },
        serde_json::Value::Object(map) => DependencyStatus {
            dnsmasq: map.get("dnsmasq").and_then(serde_json::Value::as_bool).unwrap_or(true),
            hostapd: map.get("hostapd").and_then(serde_json::Value::as_bool).unwrap_or(true),
        },
        other => {
            tracing::warn!(?other, "unexpected check_dependencies payload");
            DependencyStatus {
                dnsmasq: true,
                hostapd: true,
            }
        }
    }
}

/// Result of `install_dependencies`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstallOutcome {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Packages still absent after the install script ran.
    #[serde(default)]
    pub missing: Vec<String>,
}

// ── Settings ────────────────────────────────────────────────────────

/// Persisted settings snapshot from `load_settings`.
///
/// `ssid` / `passphrase` can arrive empty or as the literal string
/// `"undefined"` on a fresh install — consumers treat both as absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredSettings {
    #[serde(default)]
    pub ssid: Option<String>,
    #[serde(default)]
    pub passphrase: Option<String>,
    #[serde(default)]
    pub always_use_stored_credentials: bool,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// `"start,end,lease"`, e.g. `"192.168.8.100,192.168.8.200,12h"`.
    #[serde(default)]
    pub dhcp_range: Option<String>,
}

/// Server-confirmed credential triple from `update_credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredCredentials {
    pub ssid: String,
    pub passphrase: String,
    #[serde(default)]
    pub always_use_stored_credentials: bool,
}

/// Server-confirmed subnet snapshot from `update_dhcp`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DhcpConfig {
    pub ip_address: String,
    pub dhcp_range: String,
}

// ── Push events ─────────────────────────────────────────────────────

/// Push notification kinds on the `muon_device_event` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceEventKind {
    Connected,
    Disconnected,
}

/// Asynchronous device notification, delivered out of band with respect
/// to the device poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEvent {
    #[serde(rename = "type")]
    pub kind: DeviceEventKind,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
}

impl DeviceEvent {
    /// Best human-readable identifier for toast bodies.
    pub fn subject(&self) -> &str {
        self.hostname
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.ip.as_deref())
            .or(self.mac.as_deref())
            .unwrap_or("unknown device")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_list_accepts_plain_array() {
        let payload = json!([
            {"mac": "aa:bb:cc:dd:ee:ff", "ip": "192.168.8.100", "hostname": "deck", "signal_strength": -48}
        ]);
        let devices = parse_device_list(&payload);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].hostname.as_deref(), Some("deck"));
    }

    #[test]
    fn device_list_accepts_string_encoded_array() {
        let inner = json!([
            {"mac": "aa:bb:cc:dd:ee:ff", "ip": "192.168.8.101", "hostname": "phone", "signal_strength": -62}
        ]);
        let payload = serde_json::Value::String(inner.to_string());
        let devices = parse_device_list(&payload);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].signal_strength, Some(-62));
    }

    #[test]
    fn device_list_drops_rows_without_lease() {
        let payload = json!([
            {"mac": "aa:aa:aa:aa:aa:aa", "ip": null, "hostname": null, "signal_strength": -50},
            {"mac": "bb:bb:bb:bb:bb:bb", "ip": "192.168.8.102", "hostname": "", "signal_strength": -50},
            {"mac": "cc:cc:cc:cc:cc:cc", "ip": "192.168.8.103", "hostname": "laptop", "signal_strength": -50}
        ]);
        let devices = parse_device_list(&payload);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].mac, "cc:cc:cc:cc:cc:cc");
    }

    #[test]
    fn device_list_coerces_garbage_to_empty() {
        assert!(parse_device_list(&json!({"error": "hostapd_cli failed"})).is_empty());
        assert!(parse_device_list(&serde_json::Value::String("not json".into())).is_empty());
        assert!(parse_device_list(&json!(42)).is_empty());
    }

    #[test]
    fn dependency_status_from_bool() {
        let ok = normalize_dependency_status(&json!(true));
        assert!(ok.satisfied());
        let missing = normalize_dependency_status(&json!(false));
        assert!(!missing.dnsmasq);
        assert!(!missing.hostapd);
    }

    #[test]
    fn dependency_status_from_map() {
        let status = normalize_dependency_status(&json!({"dnsmasq": true, "hostapd": false}));
        assert!(status.dnsmasq);
        assert!(!status.hostapd);
    }

    #[test]
    fn device_event_subject_prefers_hostname() {
        let event: DeviceEvent = serde_json::from_value(json!({
            "type": "connected", "hostname": "deck", "ip": "192.168.8.100"
        }))
        .expect("valid event");
        assert_eq!(event.kind, DeviceEventKind::Connected);
        assert_eq!(event.subject(), "deck");
    }

    #[test]
    fn device_event_subject_falls_back_to_mac() {
        let event: DeviceEvent = serde_json::from_value(json!({
            "type": "disconnected", "mac": "aa:bb:cc:dd:ee:ff"
        }))
        .expect("valid event");
        assert_eq!(event.subject(), "aa:bb:cc:dd:ee:ff");
    }
}
