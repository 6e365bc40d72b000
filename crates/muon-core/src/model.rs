//! Domain types mirrored from backend state.

use std::fmt;

use crate::error::PanelError;
use crate::netcfg::SubnetConfig;

pub const PASSPHRASE_MIN: usize = 8;
pub const PASSPHRASE_MAX: usize = 63;

// ── Hotspot status ──────────────────────────────────────────────────

/// The panel's view of the hotspot.
///
/// `Loading` covers both directions of a toggle in flight. Whatever the
/// optimistic guess after a toggle, the displayed value is always
/// re-synchronized against the backend's `is_hotspot_active` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HotspotStatus {
    #[default]
    Stopped,
    Loading,
    Running,
}

impl HotspotStatus {
    /// Map the authoritative active flag to a terminal status.
    pub fn from_active(active: bool) -> Self {
        if active { Self::Running } else { Self::Stopped }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stopped => "Hotspot stopped",
            Self::Loading => "Processing...",
            Self::Running => "Hotspot running",
        }
    }
}

impl fmt::Display for HotspotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Credentials ─────────────────────────────────────────────────────

/// Local cache of the backend-persisted credential triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: String,
    pub passphrase: String,
    pub always_use_stored: bool,
}

impl Credentials {
    /// WPA2 passphrase length check, applied before any remote call.
    pub fn validate_passphrase(passphrase: &str) -> Result<(), PanelError> {
        let len = passphrase.chars().count();
        if (PASSPHRASE_MIN..=PASSPHRASE_MAX).contains(&len) {
            Ok(())
        } else {
            Err(PanelError::PassphraseLength)
        }
    }
}

/// Whether a stored value counts as present. Fresh installs have shipped
/// both empty strings and the literal `"undefined"`.
pub fn credential_present(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty() && s != "undefined")
}

// ── Settings snapshot ───────────────────────────────────────────────

/// Everything the settings form edits, as last confirmed by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSettings {
    pub credentials: Credentials,
    pub subnet: SubnetConfig,
    /// Host IP shown while the hotspot is running.
    pub ip_address: String,
}

// ── Signal quality ──────────────────────────────────────────────────

/// Presentation bucket for a station's signal strength.
///
/// Thresholds: >= -49 dBm excellent, >= -59 good, >= -69 fair,
/// anything weaker is weak. Stations without a reading are unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    Excellent,
    Good,
    Fair,
    Weak,
    Unknown,
}

impl SignalQuality {
    pub fn from_dbm(dbm: Option<i32>) -> Self {
        match dbm {
            None => Self::Unknown,
            Some(v) if v >= -49 => Self::Excellent,
            Some(v) if v >= -59 => Self::Good,
            Some(v) if v >= -69 => Self::Fair,
            Some(_) => Self::Weak,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Weak => "weak",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passphrase_length_bounds() {
        assert!(Credentials::validate_passphrase("1234567").is_err());
        assert!(Credentials::validate_passphrase("12345678").is_ok());
        assert!(Credentials::validate_passphrase(&"x".repeat(63)).is_ok());
        assert!(Credentials::validate_passphrase(&"x".repeat(64)).is_err());
    }

    #[test]
    fn placeholder_credentials_are_absent() {
        assert!(!credential_present(None));
        assert!(!credential_present(Some("")));
        assert!(!credential_present(Some("undefined")));
        assert!(credential_present(Some("steamdeck")));
    }

    #[test]
    fn signal_buckets_match_thresholds() {
        assert_eq!(SignalQuality::from_dbm(Some(-30)), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_dbm(Some(-49)), SignalQuality::Excellent);
        assert_eq!(SignalQuality::from_dbm(Some(-50)), SignalQuality::Good);
        assert_eq!(SignalQuality::from_dbm(Some(-59)), SignalQuality::Good);
        assert_eq!(SignalQuality::from_dbm(Some(-60)), SignalQuality::Fair);
        assert_eq!(SignalQuality::from_dbm(Some(-69)), SignalQuality::Fair);
        assert_eq!(SignalQuality::from_dbm(Some(-70)), SignalQuality::Weak);
        assert_eq!(SignalQuality::from_dbm(None), SignalQuality::Unknown);
    }

    #[test]
    fn status_reconciles_from_active_flag() {
        assert_eq!(HotspotStatus::from_active(true), HotspotStatus::Running);
        assert_eq!(HotspotStatus::from_active(false), HotspotStatus::Stopped);
    }
}
