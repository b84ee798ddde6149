//! Indodax private API (`/tapi`) client.
//!
//! Each operation is a single signed form POST. The parameter set always
//! carries `method`, `timestamp` and `pair`; operation-specific parameters
//! are merged in before encoding and signing (see [`crate::auth`]).
//!
//! Failures come in three distinguishable flavours:
//! - [`BridgeError::Http`] when the round trip itself fails,
//! - [`BridgeError::Json`] when the body is not the expected JSON,
//! - [`BridgeError::Exchange`] when the exchange answers `success = 0`.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::auth::{FormParams, SignedRequest, timestamp_millis};
use crate::models::Market;
use crate::models::orders::OpenOrder;
use crate::models::trade::{PlacedOrder, TradeRequest};
use crate::{BridgeError, Result};

/// Fallback when a failed `trade` response carries no message.
pub const TRADE_FAILED: &str = "Trade request failed";
/// Fallback when a failed `openOrders` response carries no message.
pub const OPEN_ORDERS_FAILED: &str = "Open orders request failed";
/// Fallback when a failed `cancelOrder` response carries no message.
pub const CANCEL_FAILED: &str = "Cancel order request failed";

/// Credentials and endpoint for [`TradingClient`].
#[derive(Debug, Clone)]
pub struct TradingSettings {
    pub api_url: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub market: Market,
    /// Upper bound for one HTTP round trip.
    pub timeout: Duration,
}

/// Common shape of every `/tapi` response.
#[derive(Debug, Deserialize)]
struct TapiResponse {
    #[serde(default)]
    success: i64,
    #[serde(rename = "return")]
    payload: Option<Value>,
    error: Option<String>,
}

impl TapiResponse {
    /// Turns `success = 0` into [`BridgeError::Exchange`].
    fn into_payload(self, fallback: &str) -> Result<Option<Value>> {
        if self.success == 0 {
            let message = self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(BridgeError::Exchange(message));
        }
        Ok(self.payload)
    }
}

/// Stateless signed-request client; safe to share across handlers.
#[derive(Debug, Clone)]
pub struct TradingClient {
    http: reqwest::Client,
    settings: TradingSettings,
}

impl TradingClient {
    /// Builds a client with a bounded per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: TradingSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { http, settings })
    }

    /// The market this client trades.
    #[must_use]
    pub fn market(&self) -> &Market {
        &self.settings.market
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// Transport, decode, or exchange-reported failure (see module docs).
    pub async fn place_trade(&self, request: &TradeRequest) -> Result<PlacedOrder> {
        let params = request.to_params(&self.settings.market);
        let payload = self.call("trade", params).await?.into_payload(TRADE_FAILED)?;

        let placed = match payload {
            Some(Value::Object(details)) => PlacedOrder { details },
            _ => PlacedOrder::default(),
        };
        info!(
            method = "trade",
            side = request.side.as_str(),
            order_id = ?placed.order_id(),
            "Order placed"
        );
        Ok(placed)
    }

    /// Lists resting orders for the configured pair, in server order.
    ///
    /// # Errors
    ///
    /// Transport, decode, or exchange-reported failure (see module docs).
    pub async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        let payload = self
            .call("openOrders", FormParams::new())
            .await?
            .into_payload(OPEN_ORDERS_FAILED)?;

        let orders = OpenOrder::from_payload(payload.as_ref());
        debug!(method = "openOrders", count = orders.len(), "Fetched open orders");
        Ok(orders)
    }

    /// Cancels `order_id`.
    ///
    /// # Errors
    ///
    /// Transport, decode, or exchange-reported failure (see module docs).
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        let mut params = FormParams::new();
        params.insert("order_id".into(), order_id.to_string());
        self.call("cancelOrder", params)
            .await?
            .into_payload(CANCEL_FAILED)?;

        info!(method = "cancelOrder", order_id, "Order cancelled");
        Ok(())
    }

    /// Adds the shared parameters to `params`.
    fn with_common_params(&self, method: &str, mut params: FormParams) -> FormParams {
        params.insert("method".into(), method.to_string());
        params.insert("timestamp".into(), timestamp_millis().to_string());
        params.insert("pair".into(), self.settings.market.pair());
        params
    }

    /// Signs and sends one private API call.
    async fn call(&self, method: &str, params: FormParams) -> Result<TapiResponse> {
        let params = self.with_common_params(method, params);
        let (body, signature) = SignedRequest::new(&params, &self.settings.api_secret).into_parts();

        let response = self
            .http
            .post(&self.settings.api_url)
            .header("Key", &self.settings.api_key)
            .header("Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .inspect_err(|e| warn!(method, error = %e, "Private API request failed"))?;

        let status = response.status();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(method, %status, error = %e, "Undecodable private API response");
            BridgeError::Json(e)
        })
    }
}
