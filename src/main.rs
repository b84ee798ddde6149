use std::sync::Arc;

use tapi_bridge::config::fetch_config;
use tapi_bridge::orderbook::OrderBookHandle;
use tapi_bridge::server::{self, AdminCredentials, AppState};
use tapi_bridge::session::InMemorySessionStore;
use tapi_bridge::trading::TradingClient;
use tapi_bridge::websocket::{MarketStream, TungsteniteDialer};
use tapi_bridge::{Bridge, BridgeError};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Both the stream and the HTTP client use rustls; pin the ring provider.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = fetch_config()?;
    info!(pair = %config.indodax.market.pair(), channel = %config.indodax.channel, "Configuration loaded");

    let book = OrderBookHandle::new();
    let stream = MarketStream::new(TungsteniteDialer, config.stream_settings(), book.clone())
        .start()
        .await
        .inspect_err(|e| error!("Failed to connect to market data stream: {e}"))?;

    let trading = TradingClient::new(config.trading_settings())?;
    let state = AppState::new(
        Arc::new(Bridge::new(book, trading)),
        Arc::new(InMemorySessionStore::default()),
        AdminCredentials {
            username: config.server.admin_user.clone(),
            password: config.server.admin_password.clone(),
        },
    );

    let listener = TcpListener::bind(config.server.listen_addr).await?;
    let served = server::serve(listener, state).await;

    stream.stop().await;
    served
}
