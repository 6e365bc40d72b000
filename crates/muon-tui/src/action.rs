//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use muon_core::{DependencyStatus, DeviceEvent, DeviceRecord, HotspotStatus, PanelSettings};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }
}

/// Pending confirmation action.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    KickDevice { mac: String, name: String },
    UnbanDevice { mac: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KickDevice { name, .. } => {
                write!(f, "Kick and ban {name}?")
            }
            Self::UnbanDevice { mac } => write!(f, "Unban {mac}?"),
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,

    // ── Panel state (from watch channels) ─────────────────────────
    StatusUpdated(HotspotStatus),
    DevicesUpdated(Arc<Vec<DeviceRecord>>),
    DependenciesUpdated(Option<DependencyStatus>),
    RadioBlockedUpdated(bool),
    SettingsUpdated(PanelSettings),
    DeviceEventReceived(Arc<DeviceEvent>),

    // ── Hotspot control ───────────────────────────────────────────
    RequestToggle,
    RequestKick(String),

    // ── Dependency install ────────────────────────────────────────
    RequestInstall,
    InstallFinished(Result<(), String>),

    // ── Settings save ─────────────────────────────────────────────
    RequestSaveSettings {
        credentials: muon_core::Credentials,
        subnet: muon_core::SubnetConfig,
    },
    SaveSettingsFinished(Result<(), String>),

    // ── Ban list ──────────────────────────────────────────────────
    RequestBanList,
    BanListLoaded(Vec<String>),
    RequestUnban(String),
    /// Backend confirmed the unban; the banned screen drops the row.
    UnbanAccepted(String),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
