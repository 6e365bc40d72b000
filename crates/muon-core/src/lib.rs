//! Panel logic for the Muon hotspot front-end.
//!
//! Everything the UI needs that isn't rendering lives here:
//!
//! - **[`Panel`]** — the control/status reconciliation flow. Owns watch
//!   channels for hotspot status, connected devices, dependency state,
//!   and the radio-block flag; runs the device poll task (active iff
//!   the hotspot is running); guards dependency auto-install behind a
//!   single-flight flag; and corrects every optimistic status guess
//!   against the backend's authoritative `is_hotspot_active` answer.
//!
//! - **Domain model** ([`model`]) — [`HotspotStatus`], [`Credentials`]
//!   with passphrase validation, [`SignalQuality`] dBm bucketing.
//!
//! - **[`SubnetEditor`]** — octet-level editing of the base IP and DHCP
//!   range with per-field clamping, emitting a recomposed address
//!   triple on every edit.
//!
//! The local state is a cache, never the truth: the backend owns all
//! persistence, and each mutation here is followed by adopting whatever
//! the backend confirms.

pub mod config;
pub mod error;
pub mod model;
pub mod netcfg;
pub mod panel;
pub mod passphrase;

pub use config::PanelConfig;
pub use error::PanelError;
pub use model::{Credentials, HotspotStatus, PanelSettings, SignalQuality};
pub use netcfg::{SubnetConfig, SubnetEditor, SubnetTriple};
pub use panel::Panel;

// Wire types flow straight through to UI consumers.
pub use muon_api::{DependencyStatus, DeviceEvent, DeviceEventKind, DeviceRecord};
