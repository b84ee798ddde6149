//! Order placement models.
//!
//! A [`TradeRequest`] is what the front-end submits; [`TradeRequest::to_params`]
//! turns it into the `trade` form parameters of the private API.

use rust_decimal::Decimal;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use super::Market;
use crate::auth::FormParams;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Wire name expected by the private API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Order type specifying how the order should be executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
}

impl OrderType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

/// Time in force specifying how long the order remains active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good 'til cancelled (default).
    #[default]
    Gtc,
    /// Maker-or-cancel.
    Moc,
}

impl TimeInForce {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gtc => "GTC",
            Self::Moc => "MOC",
        }
    }
}

/// An order as submitted by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    #[serde(rename = "type")]
    pub side: OrderSide,
    pub price: Decimal,
    /// Size in base currency.
    #[serde(default)]
    pub amount: Decimal,
    /// Size in quote currency; only honoured for buys.
    #[serde(default, alias = "idr_amount")]
    pub quote_amount: Decimal,
    /// `None` (or `""`) means limit.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub order_type: Option<OrderType>,
    /// `None` (or `""`) means GTC.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub time_in_force: Option<TimeInForce>,
}

/// Reads an optional enum, treating an empty string as absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("") => Ok(None),
        Some(text) => T::deserialize(text.into_deserializer()).map(Some),
    }
}

impl TradeRequest {
    /// Limit order for `amount` units of base currency at `price`.
    #[must_use]
    pub fn limit(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self {
            side,
            price,
            amount,
            quote_amount: Decimal::ZERO,
            order_type: None,
            time_in_force: None,
        }
    }

    /// Buy order spending `quote_amount` of quote currency at `price`.
    #[must_use]
    pub fn buy_with_quote(price: Decimal, quote_amount: Decimal) -> Self {
        Self {
            quote_amount,
            ..Self::limit(OrderSide::Buy, price, Decimal::ZERO)
        }
    }

    /// Returns `true` when the order is sized in quote currency.
    #[must_use]
    pub fn uses_quote_amount(&self) -> bool {
        self.side == OrderSide::Buy && self.quote_amount > Decimal::ZERO
    }

    /// Builds the operation-specific `trade` parameters.
    ///
    /// Exactly one of the base or quote amount keys is set: the quote key
    /// for a buy with a positive quote amount, the base key otherwise.
    #[must_use]
    pub fn to_params(&self, market: &Market) -> FormParams {
        let mut params = FormParams::new();
        params.insert("type".into(), self.side.as_str().into());
        params.insert(
            "order_type".into(),
            self.order_type.unwrap_or_default().as_str().into(),
        );
        params.insert(
            "time_in_force".into(),
            self.time_in_force.unwrap_or_default().as_str().into(),
        );
        params.insert("price".into(), format_amount(self.price));

        if self.uses_quote_amount() {
            params.insert(market.quote().into(), format_amount(self.quote_amount));
        } else {
            params.insert(market.base().into(), format_amount(self.amount));
        }

        params
    }
}

/// Formats with exactly 8 fractional digits.
fn format_amount(value: Decimal) -> String {
    format!("{:.8}", value.round_dp(8))
}

/// The `return` object of a successful `trade` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacedOrder {
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl PlacedOrder {
    /// Exchange-assigned order id, if reported.
    #[must_use]
    pub fn order_id(&self) -> Option<String> {
        match self.details.get("order_id")? {
            serde_json::Value::String(id) => Some(id.clone()),
            serde_json::Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}
