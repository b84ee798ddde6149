//! WebSocket connection lifecycle management.
//!
//! [`MarketStream`] connects, authenticates, subscribes to the order book
//! channel, and publishes every decoded book into an [`OrderBookHandle`].
//! When the connection drops it reconnects with a fixed backoff, forever.
//! It runs as a supervised task: [`MarketStream::start`] or
//! [`MarketStream::spawn`] return a [`StreamHandle`] that exposes the
//! current [`StreamState`] and stops the task on request.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tungstenite::Message;

use super::handler::{FeedEvent, decode_frame};
use super::{Dialer, WsReader, WsWriter, authenticate, subscribe};
use crate::models::Market;
use crate::orderbook::OrderBookHandle;
use crate::{BridgeError, Result};

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Default upper bound for one connect + authenticate + subscribe attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where to connect and what to subscribe to.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub url: String,
    /// Bearer token sent in the authentication frame.
    pub token: String,
    pub channel: String,
    pub market: Market,
    pub reconnect_delay: Duration,
    pub connect_timeout: Duration,
}

/// Lifecycle state of the market-data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Authenticating,
    Subscribing,
    Streaming,
    /// Connection lost; waiting out the backoff before the next attempt.
    Recovering,
}

/// Why the reader loop exited.
enum DisconnectReason {
    /// The connection was lost or errored.
    ConnectionError,
    /// The handle asked the task to stop.
    Shutdown,
}

/// Long-lived order book subscription.
pub struct MarketStream<D> {
    dialer: D,
    settings: StreamSettings,
    book: OrderBookHandle,
    state: watch::Sender<StreamState>,
}

impl<D: Dialer> MarketStream<D> {
    /// Creates a stream that publishes into `book`.
    #[must_use]
    pub fn new(dialer: D, settings: StreamSettings, book: OrderBookHandle) -> Self {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self {
            dialer,
            settings,
            book,
            state,
        }
    }

    /// Connects once and, on success, hands the live connection to a
    /// background task.
    ///
    /// # Errors
    ///
    /// Returns the failure of the initial connection attempt; nothing is
    /// spawned in that case.
    pub async fn start(self) -> Result<StreamHandle> {
        let session = self.connect().await?;
        Ok(self.launch(Some(session)))
    }

    /// Spawns the background task without requiring the first attempt to
    /// succeed; it keeps retrying until connected.
    #[must_use]
    pub fn spawn(self) -> StreamHandle {
        self.launch(None)
    }

    fn launch(self, session: Option<(WsWriter, WsReader)>) -> StreamHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(session, shutdown_rx));
        StreamHandle {
            shutdown: shutdown_tx,
            state,
            task,
        }
    }

    /// Runs one connect + authenticate + subscribe sequence, bounded by
    /// the connect timeout.
    ///
    /// # Errors
    ///
    /// Returns the dial or send failure, or [`BridgeError::Timeout`].
    pub async fn connect(&self) -> Result<(WsWriter, WsReader)> {
        let limit = self.settings.connect_timeout;
        tokio::time::timeout(limit, self.handshake())
            .await
            .map_err(|_| BridgeError::Timeout(limit))?
    }

    async fn handshake(&self) -> Result<(WsWriter, WsReader)> {
        self.set_state(StreamState::Connecting);
        info!(url = %self.settings.url, "Connecting to WebSocket");
        let (mut write, read) = self.dialer.dial(&self.settings.url).await?;

        self.set_state(StreamState::Authenticating);
        authenticate(&mut write, &self.settings.token).await?;

        self.set_state(StreamState::Subscribing);
        subscribe(&mut write, &self.settings.channel).await?;

        Ok((write, read))
    }

    /// Connection loop; returns only on shutdown.
    async fn run(
        self,
        mut session: Option<(WsWriter, WsReader)>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let (write, read) = match session.take() {
                Some(pair) => pair,
                None => match self.reconnect(&mut shutdown).await {
                    Some(pair) => pair,
                    None => break,
                },
            };

            self.set_state(StreamState::Streaming);
            info!(channel = %self.settings.channel, "WebSocket connected and subscribed");

            let reason = self.read_loop(read, &mut shutdown).await;
            // The writer only lives as long as the session.
            drop(write);

            match reason {
                DisconnectReason::ConnectionError => {
                    self.set_state(StreamState::Recovering);
                    info!("Connection lost, reconnecting");
                }
                DisconnectReason::Shutdown => break,
            }
        }

        self.set_state(StreamState::Disconnected);
        info!("Market stream shutting down");
    }

    /// Retries [`connect`](Self::connect) with a fixed delay until it
    /// succeeds. Returns `None` if shutdown is requested meanwhile.
    async fn reconnect(&self, shutdown: &mut watch::Receiver<bool>) -> Option<(WsWriter, WsReader)> {
        let delay = self.settings.reconnect_delay;
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let outcome = tokio::select! {
                outcome = self.connect() => outcome,
                _ = shutdown.changed() => return None,
            };

            match outcome {
                Ok(pair) => {
                    if attempt > 1 {
                        info!(attempt, "Reconnected");
                    }
                    return Some(pair);
                }
                Err(e) => {
                    error!(attempt, "Connection failed: {e}");
                    self.set_state(StreamState::Recovering);
                    info!(backoff_secs = delay.as_secs_f64(), "Backing off before retry");
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        _ = shutdown.changed() => return None,
                    }
                }
            }
        }
    }

    /// Reads frames until the connection fails or shutdown is requested.
    async fn read_loop(
        &self,
        mut read: WsReader,
        shutdown: &mut watch::Receiver<bool>,
    ) -> DisconnectReason {
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.apply(&text),
                        Some(Ok(Message::Close(frame))) => {
                            warn!(?frame, "Server closed the connection");
                            return DisconnectReason::ConnectionError;
                        }
                        Some(Ok(_)) => {} // Binary/Ping/Pong frames
                        Some(Err(e)) => {
                            warn!("WebSocket error: {e}");
                            return DisconnectReason::ConnectionError;
                        }
                        None => {
                            warn!("WebSocket stream ended");
                            return DisconnectReason::ConnectionError;
                        }
                    }
                }

                _ = shutdown.changed() => return DisconnectReason::Shutdown,
            }
        }
    }

    /// Publishes `text` if it is a well-formed order book push.
    fn apply(&self, text: &str) {
        match decode_frame(text, &self.settings.market) {
            FeedEvent::Book(snapshot) => {
                debug!(
                    pair = %snapshot.pair,
                    asks = snapshot.ask.len(),
                    bids = snapshot.bid.len(),
                    "Order book updated"
                );
                self.book.publish(snapshot);
            }
            FeedEvent::Ignored => {}
            FeedEvent::Malformed(reason) => {
                warn!(%reason, "Skipping malformed order book message");
            }
        }
    }

    fn set_state(&self, state: StreamState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(?previous, ?state, "Stream state changed");
        }
    }
}

/// Owner's handle on a running [`MarketStream`] task.
///
/// Dropping the handle also stops the task.
pub struct StreamHandle {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<StreamState>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Signals the task to stop and waits for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Market stream task failed: {e}");
        }
    }
}
