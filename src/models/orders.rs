//! Open order models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An order still resting on the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: String,
    #[serde(rename = "type")]
    pub side: String,
    pub price: f64,
    /// Remaining (unfilled) amount.
    pub amount: f64,
}

impl OpenOrder {
    /// Projects one row of an `openOrders` response.
    ///
    /// Returns `None` unless `order_id`, `type`, `price` and
    /// `remaining_amount` are all present as strings. Unparseable numbers
    /// become `0.0`.
    #[must_use]
    pub fn from_row(row: &Value) -> Option<Self> {
        let row = row.as_object()?;
        let text = |key: &str| row.get(key).and_then(Value::as_str);

        Some(Self {
            id: text("order_id")?.to_string(),
            side: text("type")?.to_string(),
            price: parse_or_zero(text("price")?),
            amount: parse_or_zero(text("remaining_amount")?),
        })
    }

    /// Projects every well-formed row of `return.orders`, keeping server order.
    #[must_use]
    pub fn from_payload(payload: Option<&Value>) -> Vec<Self> {
        payload
            .and_then(|payload| payload.get("orders"))
            .and_then(Value::as_array)
            .map(|rows| rows.iter().filter_map(Self::from_row).collect())
            .unwrap_or_default()
    }
}

fn parse_or_zero(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}
