//! Indodax order book stream and signed trading bridge.
//!
//! Keeps a live order book from the exchange's WebSocket feed and exposes
//! it, together with signed place / list / cancel calls against the private
//! API, to a session-guarded JSON front-end.

pub mod auth;
pub mod bridge;
pub mod config;
pub mod error;
pub mod models;
pub mod orderbook;
pub mod server;
pub mod session;
pub mod trading;
pub mod websocket;

pub use bridge::Bridge;
pub use error::{BridgeError, Result};
