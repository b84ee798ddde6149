//! Application configuration loaded from environment variables.
//!
//! Required:
//! - `INDODAX_API_KEY` / `INDODAX_API_SECRET` - private API credentials
//! - `INDODAX_WS_TOKEN` - bearer token for the market-data stream
//! - `INDODAX_PAIR` - traded pair, e.g. `hnst_idr`
//! - `BRIDGE_ADMIN_USER` / `BRIDGE_ADMIN_PASSWORD` - front-end login
//!
//! Optional overrides: `INDODAX_CHANNEL` (defaults to the pair's order
//! book channel), `INDODAX_WEBSOCKET_URL`, `INDODAX_API_URL`,
//! `BRIDGE_LISTEN_ADDR`, `BRIDGE_RECONNECT_SECS`,
//! `BRIDGE_CONNECT_TIMEOUT_SECS`, `BRIDGE_HTTP_TIMEOUT_SECS`.

use std::net::SocketAddr;
use std::time::Duration;

use zeroize::Zeroizing;

use crate::models::Market;
use crate::trading::TradingSettings;
use crate::websocket::StreamSettings;
use crate::{BridgeError, Result};

/// Default market-data endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://ws3.indodax.com/ws/";

/// Default private API endpoint.
const DEFAULT_API_URL: &str = "https://indodax.com/tapi";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:80";
const DEFAULT_RECONNECT_SECS: u64 = 5;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub indodax: IndodaxConfig,
    pub server: ServerConfig,
}

/// Exchange-facing configuration values.
#[derive(Debug)]
pub struct IndodaxConfig {
    pub websocket_url: String,
    pub api_url: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub ws_token: Zeroizing<String>,
    pub market: Market,
    pub channel: String,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
    pub http_timeout: Duration,
}

/// Local HTTP surface configuration.
#[derive(Debug)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub admin_user: String,
    pub admin_password: Zeroizing<String>,
}

impl AppConfig {
    /// Settings for the market-data stream.
    #[must_use]
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            url: self.indodax.websocket_url.clone(),
            token: self.indodax.ws_token.as_str().to_owned(),
            channel: self.indodax.channel.clone(),
            market: self.indodax.market.clone(),
            reconnect_delay: self.indodax.reconnect_delay,
            connect_timeout: self.indodax.connect_timeout,
        }
    }

    /// Settings for the private API client.
    #[must_use]
    pub fn trading_settings(&self) -> TradingSettings {
        TradingSettings {
            api_url: self.indodax.api_url.clone(),
            api_key: self.indodax.api_key.clone(),
            api_secret: self.indodax.api_secret.clone(),
            market: self.indodax.market.clone(),
            timeout: self.indodax.http_timeout,
        }
    }
}

/// Loads the application configuration from the process environment.
///
/// # Errors
///
/// Returns [`BridgeError::Config`] if a required variable is missing or
/// empty, or if a value cannot be parsed.
pub fn fetch_config() -> Result<AppConfig> {
    config_from(|name| std::env::var(name).ok())
}

/// Builds the configuration from an arbitrary variable lookup.
///
/// # Errors
///
/// See [`fetch_config`].
pub fn config_from<F>(lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| non_empty_var(&lookup, name);
    let required = |name: &str| {
        var(name).ok_or_else(|| BridgeError::Config(format!("{name} must be set")))
    };

    let market = Market::parse(&required("INDODAX_PAIR")?)?;
    let channel = var("INDODAX_CHANNEL").unwrap_or_else(|| market.order_book_channel());

    let indodax = IndodaxConfig {
        websocket_url: var("INDODAX_WEBSOCKET_URL")
            .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string()),
        api_url: var("INDODAX_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        api_key: required("INDODAX_API_KEY")?,
        api_secret: Zeroizing::new(required("INDODAX_API_SECRET")?),
        ws_token: Zeroizing::new(required("INDODAX_WS_TOKEN")?),
        market,
        channel,
        reconnect_delay: seconds(&var, "BRIDGE_RECONNECT_SECS", DEFAULT_RECONNECT_SECS)?,
        connect_timeout: seconds(&var, "BRIDGE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
        http_timeout: seconds(&var, "BRIDGE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
    };

    let listen = var("BRIDGE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
    let server = ServerConfig {
        listen_addr: listen.parse().map_err(|e| {
            BridgeError::Config(format!("BRIDGE_LISTEN_ADDR {listen:?} is invalid: {e}"))
        })?,
        admin_user: required("BRIDGE_ADMIN_USER")?,
        admin_password: Zeroizing::new(required("BRIDGE_ADMIN_PASSWORD")?),
    };

    Ok(AppConfig { indodax, server })
}

/// Returns the value of a variable if it exists and is non-empty.
fn non_empty_var<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|s| !s.is_empty())
}

/// Reads a whole-second duration, rejecting zero.
fn seconds<V>(var: &V, name: &str, default: u64) -> Result<Duration>
where
    V: Fn(&str) -> Option<String>,
{
    let secs = match var(name) {
        None => default,
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                BridgeError::Config(format!("{name} must be a positive number of seconds, got {raw:?}"))
            })?,
    };
    Ok(Duration::from_secs(secs))
}
