//! Async client for the Muon hotspot backend bridge.
//!
//! The backend daemon owns every piece of real networking work (hostapd,
//! dnsmasq, rfkill, DHCP leases, MAC bans). This crate is the transport
//! in front of it:
//!
//! - **[`BridgeClient`]** — request/response RPC over HTTP. Each backend
//!   operation is a named, typed one-shot call; the `{result, error}`
//!   envelope is stripped before the caller sees the payload.
//!   Polymorphic backend payloads (dependency check returning a bare
//!   bool on old backends, device lists arriving JSON-string-encoded)
//!   are normalized here so consumers only ever see one shape.
//!
//! - **[`EventSubscription`]** — WebSocket push channel delivering
//!   device connected/disconnected notifications independent of any
//!   poll cycle, behind an explicit subscription handle.

pub mod bridge;
pub mod error;
pub mod events;
pub mod types;

pub use bridge::BridgeClient;
pub use error::Error;
pub use events::{EventSubscription, ReconnectConfig};
pub use types::{
    DependencyStatus, DeviceEvent, DeviceEventKind, DeviceRecord, DhcpConfig, InstallOutcome,
    StoredCredentials, StoredSettings,
};
