//! Authentication and channel subscription frames.
//!
//! Both frames are sent back-to-back on a fresh connection; the stream does
//! not wait for the authentication acknowledgement before subscribing.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::{AuthRequest, SubscribeRequest};

/// Sends the authentication frame carrying the bearer `token`.
///
/// # Errors
///
/// Returns a [`BridgeError`](crate::BridgeError) if sending the frame fails.
pub async fn authenticate(write: &mut WsWriter, token: &str) -> Result<()> {
    let request = AuthRequest::new(token);
    let json = serde_json::to_string(&request)?;
    write.send(Message::Text(json.into())).await?;
    debug!(id = request.id, "Sent authentication frame");

    Ok(())
}

/// Subscribes to `channel`.
///
/// # Errors
///
/// Returns a [`BridgeError`](crate::BridgeError) if sending the subscription frame fails.
pub async fn subscribe(write: &mut WsWriter, channel: &str) -> Result<()> {
    let request = SubscribeRequest::new(channel);
    let json = serde_json::to_string(&request)?;
    debug!("Sending subscribe request: {}", json);
    write.send(Message::Text(json.into())).await?;
    info!(channel, "Subscribed to channel");

    Ok(())
}
