//! Bridge RPC transport.
//!
//! Wraps `reqwest::Client` with Muon-specific URL construction and
//! envelope unwrapping. Every operation is `POST {base}/bridge/{method}`
//! with a JSON array of positional arguments (argument order is
//! significant to the backend) and a `{result, error}` envelope coming
//! back. All methods return the unwrapped `result` payload — the
//! envelope is stripped before the caller sees it.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::types::{
    DependencyStatus, DeviceRecord, DhcpConfig, InstallOutcome, StoredCredentials, StoredSettings,
    normalize_dependency_status, parse_device_list,
};

/// Wire envelope around every bridge response.
#[derive(serde::Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the backend bridge.
///
/// Cheap to clone — `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BridgeClient {
    /// Build a client against the given bridge root
    /// (e.g. `http://127.0.0.1:1337`).
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Build from a pre-configured `reqwest::Client` (tests, custom TLS).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The bridge root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// WebSocket URL for the push-event channel.
    ///
    /// Same host as the bridge, `ws`/`wss` scheme, `/events` path.
    pub fn events_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.join("events")?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::Events(format!("cannot derive ws scheme from {url}")))?;
        Ok(url)
    }

    // ── Transport core ──────────────────────────────────────────────

    /// Invoke a named method and return the raw `result` payload.
    async fn call_raw(&self, method: &str, args: Value) -> Result<Value, Error> {
        let url = self.base_url.join(&format!("bridge/{method}"))?;
        trace!(%method, %args, "bridge call");

        let response = self.http.post(url).json(&args).send().await?;
        let envelope: Envelope = response.error_for_status()?.json().await?;

        if let Some(message) = envelope.error {
            debug!(%method, %message, "bridge reported failure");
            return Err(Error::bridge(method, message));
        }
        Ok(envelope.result)
    }

    /// Invoke a named method and decode the `result` payload.
    async fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, Error> {
        let result = self.call_raw(method, args).await?;
        serde_json::from_value(result).map_err(|e| Error::decode(method, e))
    }

    // ── Hotspot control ─────────────────────────────────────────────

    pub async fn start_hotspot(&self) -> Result<(), Error> {
        self.call_raw("start_hotspot", json!([])).await.map(|_| ())
    }

    pub async fn stop_hotspot(&self) -> Result<(), Error> {
        self.call_raw("stop_hotspot", json!([])).await.map(|_| ())
    }

    /// Authoritative hotspot-active flag. This is the reconciliation
    /// source of truth after every toggle attempt.
    pub async fn is_hotspot_active(&self) -> Result<bool, Error> {
        self.call("is_hotspot_active", json!([])).await
    }

    pub async fn is_rfkill_blocking_wlan(&self) -> Result<bool, Error> {
        self.call("is_rfkill_blocking_wlan", json!([])).await
    }

    // ── Dependencies ────────────────────────────────────────────────

    /// Check package presence, normalized across backend revisions
    /// (bare bool or `{name: bool}` map — callers always get the pair).
    pub async fn check_dependencies(&self) -> Result<DependencyStatus, Error> {
        let raw = self.call_raw("check_dependencies", json!([])).await?;
        Ok(normalize_dependency_status(&raw))
    }

    pub async fn install_dependencies(
        &self,
        missing_dnsmasq: bool,
        missing_hostapd: bool,
    ) -> Result<InstallOutcome, Error> {
        self.call(
            "install_dependencies",
            json!([missing_dnsmasq, missing_hostapd]),
        )
        .await
    }

    // ── Settings ────────────────────────────────────────────────────

    pub async fn load_settings(&self) -> Result<StoredSettings, Error> {
        self.call("load_settings", json!([])).await
    }

    /// Push a credential triple; returns the backend-confirmed values,
    /// which overwrite any locally held copy.
    pub async fn update_credentials(
        &self,
        ssid: &str,
        passphrase: &str,
        always_use: bool,
    ) -> Result<StoredCredentials, Error> {
        self.call("update_credentials", json!([ssid, passphrase, always_use]))
            .await
    }

    pub async fn update_dhcp(
        &self,
        base_ip: &str,
        dhcp_start: &str,
        dhcp_end: &str,
    ) -> Result<DhcpConfig, Error> {
        self.call("update_dhcp", json!([base_ip, dhcp_start, dhcp_end]))
            .await
    }

    pub async fn get_ip_address(&self) -> Result<String, Error> {
        self.call("get_ip_address", json!([])).await
    }

    pub async fn get_hostname(&self) -> Result<String, Error> {
        self.call("get_hostname", json!([])).await
    }

    // ── Connected devices ───────────────────────────────────────────

    /// Current station list. Malformed or string-encoded payloads are
    /// coerced to an empty list — a bad poll never produces an error.
    pub async fn get_connected_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        let raw = self.call_raw("get_connected_devices", json!([])).await?;
        Ok(parse_device_list(&raw))
    }

    /// Kick (and ban) a station by MAC. `true` on success.
    pub async fn kick_mac(&self, mac: &str) -> Result<bool, Error> {
        self.call("kick_mac", json!([mac])).await
    }

    // ── Ban list ────────────────────────────────────────────────────

    pub async fn retrieve_ban_list(&self) -> Result<Vec<String>, Error> {
        self.call("retrieve_ban_list", json!([])).await
    }

    pub async fn unban_mac_address(&self, mac: &str) -> Result<bool, Error> {
        self.call("unban_mac_address", json!([mac])).await
    }

    // ── Suspend / resume ────────────────────────────────────────────

    /// Fire-and-forget suspend notification. Errors are logged, never
    /// propagated — the OS is going down regardless.
    pub async fn suspend_ap(&self) {
        if let Err(e) = self.call_raw("suspend_ap", json!([])).await {
            debug!(error = %e, "suspend_ap notification failed");
        }
    }

    /// Fire-and-forget resume notification.
    pub async fn resume_ap(&self) {
        if let Err(e) = self.call_raw("resume_ap", json!([])).await {
            debug!(error = %e, "resume_ap notification failed");
        }
    }
}
