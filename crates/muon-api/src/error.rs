//! Error types for the bridge client.

use thiserror::Error;

/// Everything that can go wrong talking to the backend bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP-level failure (connect, timeout, non-success status).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered, but reported a failure in the envelope.
    #[error("bridge call `{method}` failed: {message}")]
    Bridge { method: String, message: String },

    /// The backend answered with a payload we couldn't decode.
    #[error("failed to decode `{method}` response: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    /// Malformed bridge URL (construction or ws-scheme rewrite).
    #[error("invalid bridge URL: {0}")]
    Url(#[from] url::ParseError),

    /// Push-event channel failure.
    #[error("event channel error: {0}")]
    Events(String),
}

impl Error {
    pub(crate) fn bridge(method: &str, message: impl Into<String>) -> Self {
        Self::Bridge {
            method: method.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(method: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            method: method.to_owned(),
            source,
        }
    }
}
