//! Push-event channel with auto-reconnect.
//!
//! Connects to the backend's WebSocket endpoint and streams parsed
//! `muon_device_event` payloads through a [`tokio::sync::broadcast`]
//! channel. The subscription is an explicit handle: acquired once at
//! startup, released by cancelling its token — there is no global
//! registration state to guard against double-subscription.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::types::DeviceEvent;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Exponential backoff configuration for reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Handle to the running push-event stream.
///
/// Dropping the handle (or cancelling the token it was built with)
/// tears down the background task; there is at most one active
/// subscription per handle lifetime.
pub struct EventSubscription {
    event_rx: broadcast::Receiver<Arc<DeviceEvent>>,
    cancel: CancellationToken,
}

impl EventSubscription {
    /// Spawn the background listener. Returns immediately; the first
    /// connection attempt happens asynchronously.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            event_loop(ws_url, event_tx, reconnect, task_cancel).await;
        });

        Self { event_rx, cancel }
    }

    /// A new broadcast receiver for the event stream. A slow consumer
    /// observes `RecvError::Lagged` rather than blocking the stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DeviceEvent>> {
        self.event_rx.resubscribe()
    }

    /// Release the subscription.
    pub fn release(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background loop ─────────────────────────────────────────────────

/// connect → read until drop → backoff → reconnect, forever or until
/// cancelled.
async fn event_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<DeviceEvent>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => {
                match result {
                    // Clean close — reconnect immediately with a fresh counter.
                    Ok(()) => {
                        if cancel.is_cancelled() {
                            break;
                        }
                        tracing::info!("event channel closed cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "event channel error");
                        let delay = backoff_delay(attempt, &reconnect);
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(delay) => {}
                        }
                        attempt = attempt.saturating_add(1);
                    }
                }
            }
        }
    }

    tracing::debug!("event loop exiting");
}

fn backoff_delay(attempt: u32, config: &ReconnectConfig) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(16));
    config
        .initial_delay
        .saturating_mul(factor)
        .min(config.max_delay)
}

/// Establish one connection and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<DeviceEvent>>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::debug!(url = %url, "connecting event channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::Events(e.to_string()))?;

    tracing::info!("event channel connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, event_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // pong replies are handled by tungstenite
                    }
                    Some(Ok(tungstenite::Message::Close(_))) => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(Error::Events(e.to_string())),
                    None => return Ok(()),
                }
            }
        }
    }
}

/// Decode one text frame. Frames that don't parse as a device event are
/// logged and dropped — the channel carries nothing else.
fn parse_and_broadcast(text: &str, event_tx: &broadcast::Sender<Arc<DeviceEvent>>) {
    match serde_json::from_str::<DeviceEvent>(text) {
        Ok(event) => {
            // send only fails when there are no receivers; that's fine.
            let _ = event_tx.send(Arc::new(event));
        }
        Err(e) => {
            tracing::warn!(error = %e, frame = %text, "unparseable device event frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(backoff_delay(0, &config), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, &config), Duration::from_secs(4));
        assert_eq!(backoff_delay(10, &config), Duration::from_secs(30));
        assert_eq!(backoff_delay(u32::MAX, &config), Duration::from_secs(30));
    }

    #[test]
    fn parse_and_broadcast_drops_garbage() {
        let (tx, mut rx) = broadcast::channel(4);
        parse_and_broadcast("not json", &tx);
        assert!(rx.try_recv().is_err());

        parse_and_broadcast(r#"{"type":"connected","hostname":"deck"}"#, &tx);
        let event = rx.try_recv().expect("event broadcast");
        assert_eq!(event.subject(), "deck");
    }
}
