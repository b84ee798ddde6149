//! Shared models for the Indodax market-data stream and private API.
//!
//! Contains the market identity (base/quote currencies) and the outbound
//! stream control frames. Order book and trading types live in the
//! submodules.

pub mod book;
pub mod orders;
pub mod trade;

use serde::Serialize;

use crate::{BridgeError, Result};

/// A traded market such as `hnst_idr`.
///
/// The base and quote codes drive several wire names: the `pair` form
/// parameter, the order book channel, the per-level volume keys and the
/// amount keys of a trade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    base: String,
    quote: String,
}

impl Market {
    /// Creates a market from its base and quote currency codes.
    #[must_use]
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            base: base.to_ascii_lowercase(),
            quote: quote.to_ascii_lowercase(),
        }
    }

    /// Parses an underscore-separated pair identifier like `hnst_idr`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] unless the identifier has exactly
    /// two non-empty parts.
    pub fn parse(pair: &str) -> Result<Self> {
        match pair.split_once('_') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() && !quote.contains('_') => {
                Ok(Self::new(base, quote))
            }
            _ => Err(BridgeError::Config(format!(
                "invalid trading pair {pair:?}, expected <base>_<quote>"
            ))),
        }
    }

    /// Base currency code, e.g. `hnst`.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote currency code, e.g. `idr`.
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Pair identifier used by the private API (`hnst_idr`).
    #[must_use]
    pub fn pair(&self) -> String {
        format!("{}_{}", self.base, self.quote)
    }

    /// Default order book channel for this market (`market:order-book-hnstidr`).
    #[must_use]
    pub fn order_book_channel(&self) -> String {
        format!("market:order-book-{}{}", self.base, self.quote)
    }

    /// Key holding the base volume of a book level (`hnst_volume`).
    #[must_use]
    pub fn base_volume_key(&self) -> String {
        format!("{}_volume", self.base)
    }

    /// Key holding the quote volume of a book level (`idr_volume`).
    #[must_use]
    pub fn quote_volume_key(&self) -> String {
        format!("{}_volume", self.quote)
    }
}

/// Token parameter of an [`AuthRequest`].
#[derive(Debug, Serialize)]
pub struct AuthParams {
    pub token: String,
}

/// First frame on a fresh stream connection.
#[derive(Debug, Serialize)]
pub struct AuthRequest {
    pub params: AuthParams,
    pub id: u64,
}

impl AuthRequest {
    /// Creates the authentication frame for `token`.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            params: AuthParams {
                token: token.to_string(),
            },
            id: 1,
        }
    }
}

/// Channel parameter of a [`SubscribeRequest`].
#[derive(Debug, Serialize)]
pub struct SubscribeParams {
    pub channel: String,
}

/// Second frame on a fresh stream connection.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest {
    /// Numeric method code; `1` is subscribe.
    pub method: u8,
    pub params: SubscribeParams,
    pub id: u64,
}

impl SubscribeRequest {
    /// Creates the subscription frame for `channel`.
    #[must_use]
    pub fn new(channel: &str) -> Self {
        Self {
            method: 1,
            params: SubscribeParams {
                channel: channel.to_string(),
            },
            id: 2,
        }
    }
}
