//! Panel runtime configuration.

use std::time::Duration;

use url::Url;

/// Default bridge endpoint when nothing is configured.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:1337/";

/// Device poll cadence while the hotspot is running. Anything between
/// 2 and 5 seconds is reasonable for a handful of clients; default to
/// the slower end and keep it configurable.
pub const DEFAULT_DEVICE_POLL_MS: u64 = 5000;

/// Settle delay between the install script finishing and the dependency
/// re-check (package databases lag the script's exit).
pub const DEFAULT_INSTALL_SETTLE_MS: u64 = 1500;

/// Configuration for a [`Panel`](crate::Panel).
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Backend bridge root URL.
    pub bridge_url: Url,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Connected-device poll interval while running.
    pub device_poll_interval: Duration,
    /// Delay before re-querying dependencies after an install.
    pub install_settle_delay: Duration,
}

impl PanelConfig {
    pub fn new(bridge_url: Url) -> Self {
        Self {
            bridge_url,
            request_timeout: Duration::from_secs(10),
            device_poll_interval: Duration::from_millis(DEFAULT_DEVICE_POLL_MS),
            install_settle_delay: Duration::from_millis(DEFAULT_INSTALL_SETTLE_MS),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        let url = Url::parse(DEFAULT_BRIDGE_URL).expect("default bridge URL parses");
        Self::new(url)
    }
}
