//! Crate-level error types.
//!
//! [`BridgeError`] unifies every error source (configuration, WebSocket,
//! HTTP, JSON, exchange-reported failures) behind a single enum so callers
//! can tell a dropped connection apart from a rejected order while still
//! using the `?` operator for easy propagation.

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A required environment variable was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// An HTTP round trip to the trading endpoint failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The exchange answered with `success = 0`.
    #[error("{0}")]
    Exchange(String),

    /// A connection attempt did not finish in time.
    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Binding or serving the local HTTP listener failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` for connection-level failures (dial, read, write,
    /// HTTP transport, timeouts).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::WebSocket(_) | Self::Http(_) | Self::Timeout(_) | Self::Io(_)
        )
    }

    /// Message safe to show to a front-end user.
    ///
    /// Exchange-reported failures pass through verbatim; everything else is
    /// collapsed into a generic sentence so internal details never leak.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Exchange(message) => message.clone(),
            Self::Json(_) => "Unexpected response from exchange".to_string(),
            Self::Config(_) => "Service is misconfigured".to_string(),
            Self::WebSocket(_) | Self::Http(_) | Self::Timeout(_) | Self::Io(_) => {
                "Exchange is unreachable".to_string()
            }
        }
    }
}
