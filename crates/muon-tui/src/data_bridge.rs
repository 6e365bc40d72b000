//! Data bridge — connects [`Panel`] watch channels to TUI actions.
//!
//! Runs as a background task: subscribes to the panel's reactive state
//! and the push-event channel, forwarding every change as an [`Action`]
//! through the TUI's action channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use muon_core::Panel;

use crate::action::{Action, Notification};

/// Spawn the data bridge connecting [`Panel`] reactive state to the TUI.
///
/// Runs the panel mount sequence, pushes initial snapshots, then loops
/// forwarding every state change and push event as an [`Action`]. Shuts
/// down cleanly on cancellation.
pub async fn spawn_data_bridge(
    panel: Panel,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    if let Err(e) = panel.init().await {
        warn!(error = %e, "panel mount failed");
        let _ = action_tx.send(Action::Notify(Notification::error(format!(
            "Backend unreachable: {e}"
        ))));
        return;
    }

    let mut status = panel.status_rx();
    let mut devices = panel.devices_rx();
    let mut dependencies = panel.dependencies_rx();
    let mut radio_blocked = panel.radio_blocked_rx();
    let mut settings = panel.settings_rx();

    // Push-event subscription failing is not fatal — the poll still runs.
    // The handle must outlive the loop: dropping it tears the stream down.
    let subscription = match panel.subscribe_events() {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            warn!(error = %e, "push-event channel unavailable");
            None
        }
    };
    let mut events = subscription.as_ref().map(|s| s.subscribe());

    // Push initial snapshots so screens have data immediately
    let _ = action_tx.send(Action::StatusUpdated(*status.borrow_and_update()));
    let _ = action_tx.send(Action::DevicesUpdated(devices.borrow_and_update().clone()));
    let _ = action_tx.send(Action::DependenciesUpdated(
        *dependencies.borrow_and_update(),
    ));
    let _ = action_tx.send(Action::RadioBlockedUpdated(
        *radio_blocked.borrow_and_update(),
    ));
    if let Some(snapshot) = settings.borrow_and_update().clone() {
        let _ = action_tx.send(Action::SettingsUpdated(snapshot));
    }

    // Stream loop — forward every change until cancelled
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = action_tx.send(Action::StatusUpdated(*status.borrow_and_update()));
            }
            changed = devices.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = action_tx.send(Action::DevicesUpdated(devices.borrow_and_update().clone()));
            }
            changed = dependencies.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = action_tx.send(Action::DependenciesUpdated(*dependencies.borrow_and_update()));
            }
            changed = radio_blocked.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = action_tx.send(Action::RadioBlockedUpdated(*radio_blocked.borrow_and_update()));
            }
            changed = settings.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(snapshot) = settings.borrow_and_update().clone() {
                    let _ = action_tx.send(Action::SettingsUpdated(snapshot));
                }
            }
            event = recv_event(&mut events) => {
                if let Some(event) = event {
                    let _ = action_tx.send(Action::DeviceEventReceived(event));
                }
            }
        }
    }

    panel.shutdown();
    debug!("data bridge shut down");
}

/// Receive the next push event, pending forever when the channel is
/// absent so the select arm never fires.
async fn recv_event(
    events: &mut Option<tokio::sync::broadcast::Receiver<std::sync::Arc<muon_core::DeviceEvent>>>,
) -> Option<std::sync::Arc<muon_core::DeviceEvent>> {
    match events {
        Some(rx) => match rx.recv().await {
            Ok(event) => Some(event),
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "device event stream lagged");
                None
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                *events = None;
                None
            }
        },
        None => std::future::pending().await,
    }
}
