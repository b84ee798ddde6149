//! The client object handed to request handlers.
//!
//! [`Bridge`] pairs the read side of the streamed order book with the
//! private API client. Every method is safe to call from many handlers at
//! once: book reads take a short read lock, trading calls share nothing.

use std::sync::Arc;

use crate::Result;
use crate::models::book::OrderBookSnapshot;
use crate::models::orders::OpenOrder;
use crate::models::trade::{PlacedOrder, TradeRequest};
use crate::orderbook::OrderBookHandle;
use crate::trading::TradingClient;

/// Order book reads plus place / list / cancel.
#[derive(Debug, Clone)]
pub struct Bridge {
    book: OrderBookHandle,
    trading: TradingClient,
}

impl Bridge {
    /// Combines a book fed by a [`MarketStream`](crate::websocket::MarketStream)
    /// with a trading client.
    #[must_use]
    pub fn new(book: OrderBookHandle, trading: TradingClient) -> Self {
        Self { book, trading }
    }

    /// Latest order book; never partially updated.
    #[must_use]
    pub fn order_book(&self) -> Arc<OrderBookSnapshot> {
        self.book.snapshot()
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// See [`TradingClient::place_trade`].
    pub async fn place_trade(&self, request: &TradeRequest) -> Result<PlacedOrder> {
        self.trading.place_trade(request).await
    }

    /// Lists open orders for the configured pair.
    ///
    /// # Errors
    ///
    /// See [`TradingClient::open_orders`].
    pub async fn open_orders(&self) -> Result<Vec<OpenOrder>> {
        self.trading.open_orders().await
    }

    /// Cancels an order by id.
    ///
    /// # Errors
    ///
    /// See [`TradingClient::cancel_order`].
    pub async fn cancel_order(&self, order_id: &str) -> Result<()> {
        self.trading.cancel_order(order_id).await
    }
}
