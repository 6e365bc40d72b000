//! System sleep monitor — forwards suspend/resume to the backend.
//!
//! Listens for logind's `PrepareForSleep` signal over the system D-Bus
//! and notifies the panel so the backend can park and restore the access
//! point around suspend. On systems without logind the monitor simply
//! never fires; hotspot control works the same without it.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use muon_core::Panel;

#[zbus::proxy(
    interface = "org.freedesktop.login1.Manager",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1"
)]
trait LoginManager {
    #[zbus(signal)]
    fn prepare_for_sleep(&self, start: bool) -> zbus::Result<()>;
}

/// Spawn the sleep monitor task. Returns immediately; connection setup
/// and signal subscription happen in the background.
pub fn spawn_sleep_monitor(panel: Panel, cancel: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = run(panel, cancel).await {
            warn!(error = %e, "sleep monitor unavailable");
        }
    });
}

async fn run(panel: Panel, cancel: CancellationToken) -> zbus::Result<()> {
    let connection = zbus::Connection::system().await?;
    let proxy = LoginManagerProxy::new(&connection).await?;
    let mut stream = proxy.receive_prepare_for_sleep().await?;

    info!("sleep monitor attached to logind");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            signal = stream.next() => {
                let Some(signal) = signal else { break };
                let Ok(args) = signal.args() else { continue };
                if args.start {
                    debug!("system suspending, parking access point");
                    panel.notify_suspend().await;
                } else {
                    debug!("system resumed, restoring access point");
                    panel.notify_resume().await;
                }
            }
        }
    }

    Ok(())
}
