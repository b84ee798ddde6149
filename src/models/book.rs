//! Order book channel models.

use std::collections::HashMap;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use super::Market;

/// Full order book for one pair, as last published by the stream.
///
/// Serializes the way the exchange sends it: each level carries its
/// volumes under the market's own keys (`hnst_volume`, `idr_volume`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBookSnapshot {
    pub pair: String,
    pub ask: Vec<PriceLevel>,
    pub bid: Vec<PriceLevel>,
    pub volume_keys: VolumeKeys,
}

/// A single price level in the order book.
///
/// Values are kept as the exchange's decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: String,
    pub base_volume: String,
    pub quote_volume: String,
}

/// Names under which a level's base and quote volumes appear on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeKeys {
    pub base: String,
    pub quote: String,
}

impl VolumeKeys {
    #[must_use]
    pub fn for_market(market: &Market) -> Self {
        Self {
            base: market.base_volume_key(),
            quote: market.quote_volume_key(),
        }
    }
}

impl Serialize for OrderBookSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OrderBookSnapshot", 3)?;
        state.serialize_field("pair", &self.pair)?;
        state.serialize_field("ask", &Side(&self.ask, &self.volume_keys))?;
        state.serialize_field("bid", &Side(&self.bid, &self.volume_keys))?;
        state.end()
    }
}

/// One side of the book paired with the key names to emit.
struct Side<'a>(&'a [PriceLevel], &'a VolumeKeys);

impl Serialize for Side<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let Side(levels, keys) = *self;
        serializer.collect_seq(levels.iter().map(|level| Keyed(level, keys)))
    }
}

struct Keyed<'a>(&'a PriceLevel, &'a VolumeKeys);

impl Serialize for Keyed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let Keyed(level, keys) = *self;
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("price", &level.price)?;
        map.serialize_entry(&keys.base, &level.base_volume)?;
        map.serialize_entry(&keys.quote, &level.quote_volume)?;
        map.end()
    }
}

/// Envelope of every inbound stream frame.
///
/// Only frames carrying `result.data.data` are order book pushes;
/// connection acks and heartbeats stop short of that path.
#[derive(Debug, Deserialize)]
pub struct StreamFrame {
    pub result: Option<ChannelResult>,
}

/// `result` object of a [`StreamFrame`].
#[derive(Debug, Deserialize)]
pub struct ChannelResult {
    pub channel: Option<String>,
    pub data: Option<ChannelData>,
}

/// `result.data` object of a [`StreamFrame`].
#[derive(Debug, Deserialize)]
pub struct ChannelData {
    pub data: Option<serde_json::Value>,
}

impl StreamFrame {
    /// Takes the `result.data.data` object, if the frame has one.
    #[must_use]
    pub fn into_payload(self) -> Option<serde_json::Value> {
        self.result?
            .data?
            .data
            .filter(serde_json::Value::is_object)
    }
}

/// Order book push found at `result.data.data`.
#[derive(Debug, Deserialize)]
pub struct BookPayload {
    pub pair: String,
    pub ask: Vec<RawLevel>,
    pub bid: Vec<RawLevel>,
}

/// A level as sent on the wire: `price` plus `<currency>_volume` keys.
#[derive(Debug, Deserialize)]
pub struct RawLevel {
    pub price: String,
    #[serde(flatten)]
    pub volumes: HashMap<String, serde_json::Value>,
}

impl RawLevel {
    fn into_level(self, market: &Market) -> Option<PriceLevel> {
        let volume = |key: String| {
            self.volumes
                .get(&key)
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        };

        Some(PriceLevel {
            base_volume: volume(market.base_volume_key())?,
            quote_volume: volume(market.quote_volume_key())?,
            price: self.price,
        })
    }
}

impl BookPayload {
    /// Converts the wire payload into a snapshot.
    ///
    /// Fails as a whole if any level lacks one of the market's volume keys,
    /// so a half-converted book is never produced.
    ///
    /// # Errors
    ///
    /// Returns a description of the first offending level.
    pub fn into_snapshot(self, market: &Market) -> std::result::Result<OrderBookSnapshot, String> {
        let convert = |side: &str, levels: Vec<RawLevel>| {
            levels
                .into_iter()
                .enumerate()
                .map(|(i, level)| {
                    level.into_level(market).ok_or_else(|| {
                        format!(
                            "{side}[{i}] lacks string {} / {}",
                            market.base_volume_key(),
                            market.quote_volume_key()
                        )
                    })
                })
                .collect::<std::result::Result<Vec<_>, _>>()
        };

        Ok(OrderBookSnapshot {
            ask: convert("ask", self.ask)?,
            bid: convert("bid", self.bid)?,
            pair: self.pair,
            volume_keys: VolumeKeys::for_market(market),
        })
    }
}
