//! Async WebSocket client for the Indodax market-data stream.
//!
//! This module is organized by domain:
//! - [`subscription`] - Authentication and channel subscription frames
//! - [`handler`] - Incoming frame decoding
//! - [`connection`] - Connection lifecycle, reconnection and publication

mod connection;
mod handler;
mod subscription;

use std::future::Future;
use std::pin::Pin;

use futures_util::{Sink, Stream, StreamExt};
use tokio_tungstenite::connect_async;
use tracing::info;
use tungstenite::Message;

use crate::Result;

pub use connection::{MarketStream, StreamHandle, StreamSettings, StreamState};
pub use handler::{FeedEvent, decode_frame};
pub use subscription::{authenticate, subscribe};

/// Write half of a market-data connection.
pub type WsWriter = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;

/// Read half of a market-data connection.
pub type WsReader = Pin<Box<dyn Stream<Item = std::result::Result<Message, tungstenite::Error>> + Send>>;

/// Opens duplex connections for [`MarketStream`].
///
/// The production implementation is [`TungsteniteDialer`]; tests script
/// their own to simulate outages and inbound frames.
pub trait Dialer: Send + Sync + 'static {
    /// Opens a connection to `url`.
    fn dial(&self, url: &str) -> impl Future<Output = Result<(WsWriter, WsReader)>> + Send;
}

/// Dials real WebSocket endpoints over rustls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteDialer;

impl Dialer for TungsteniteDialer {
    async fn dial(&self, url: &str) -> Result<(WsWriter, WsReader)> {
        connect(url).await
    }
}

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`BridgeError`](crate::BridgeError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    let (write, read) = ws_stream.split();
    Ok((Box::pin(write), Box::pin(read)))
}
