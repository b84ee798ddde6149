//! Incoming frame decoding.

use crate::models::Market;
use crate::models::book::{BookPayload, OrderBookSnapshot, StreamFrame};

/// What a single inbound text frame turned out to be.
#[derive(Debug, PartialEq, Eq)]
pub enum FeedEvent {
    /// A complete order book for the subscribed pair.
    Book(OrderBookSnapshot),
    /// Not an order book push (ack, heartbeat, other channel).
    Ignored,
    /// An order book push whose contents had the wrong shape.
    Malformed(String),
}

/// Decodes one text frame.
///
/// Frames that do not carry a `result.data.data` object are
/// [`FeedEvent::Ignored`]. Frames that do, but whose payload lacks the pair,
/// either side, or a level field, are [`FeedEvent::Malformed`]. The whole
/// snapshot is built here, before any lock is taken.
#[must_use]
pub fn decode_frame(text: &str, market: &Market) -> FeedEvent {
    let Some(payload) = serde_json::from_str::<StreamFrame>(text)
        .ok()
        .and_then(StreamFrame::into_payload)
    else {
        return FeedEvent::Ignored;
    };

    let book = match serde_json::from_value::<BookPayload>(payload) {
        Ok(book) => book,
        Err(e) => return FeedEvent::Malformed(e.to_string()),
    };

    match book.into_snapshot(market) {
        Ok(snapshot) => FeedEvent::Book(snapshot),
        Err(reason) => FeedEvent::Malformed(reason),
    }
}
