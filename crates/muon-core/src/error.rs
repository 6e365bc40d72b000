//! Panel error taxonomy.
//!
//! Validation failures are caught before any remote call; bridge
//! failures are caught per call-site and surfaced as toasts by the UI.
//! Nothing here is fatal.

use thiserror::Error;

use crate::model::{PASSPHRASE_MAX, PASSPHRASE_MIN};

#[derive(Debug, Error)]
pub enum PanelError {
    /// Client-side validation — no remote call was issued.
    #[error("passphrase must be between {PASSPHRASE_MIN} and {PASSPHRASE_MAX} characters")]
    PassphraseLength,

    /// A second install attempt arrived while one was in flight.
    #[error("dependency install already in progress")]
    InstallInFlight,

    /// The install script ran but left packages missing.
    #[error("dependency install failed: {0}")]
    InstallFailed(String),

    /// Bridge transport or backend failure.
    #[error(transparent)]
    Bridge(#[from] muon_api::Error),
}
