//! Shared test utilities: a scripted dialer and fixture helpers.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use futures_util::{sink, stream};
use tapi_bridge::models::Market;
use tapi_bridge::websocket::{Dialer, StreamHandle, StreamSettings, StreamState, WsReader, WsWriter};
use tapi_bridge::{BridgeError, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tungstenite::Message;

pub const ORDER_BOOK: &str = include_str!("../fixtures/order_book.json");
pub const ORDER_BOOK_UPDATE: &str = include_str!("../fixtures/order_book_update.json");
pub const MALFORMED_BOOK: &str = include_str!("../fixtures/malformed_book.json");
pub const AUTH_ACK: &str = include_str!("../fixtures/auth_ack.json");
pub const SUBSCRIBE_ACK: &str = include_str!("../fixtures/subscribe_ack.json");
pub const OPEN_ORDERS: &str = include_str!("../fixtures/open_orders.json");
pub const TRADE_SUCCESS: &str = include_str!("../fixtures/trade_success.json");

pub const CHANNEL: &str = "market:order-book-hnstidr";
pub const TOKEN: &str = "test-ws-token";

pub fn market() -> Market {
    Market::new("hnst", "idr")
}

/// Stream settings with short delays so reconnect tests run quickly.
pub fn stream_settings() -> StreamSettings {
    StreamSettings {
        url: "wss://stream.test/ws/".into(),
        token: TOKEN.into(),
        channel: CHANNEL.into(),
        market: market(),
        reconnect_delay: Duration::from_millis(10),
        connect_timeout: Duration::from_secs(1),
    }
}

/// Server side of one scripted connection.
pub struct FakeServer {
    /// Frames delivered to the client; dropping it ends the client's stream.
    pub frames: mpsc::UnboundedSender<std::result::Result<Message, tungstenite::Error>>,
    /// Frames the client sent.
    pub sent: mpsc::UnboundedReceiver<Message>,
}

impl FakeServer {
    pub fn push_text(&self, text: &str) {
        self.frames
            .send(Ok(Message::Text(text.to_string().into())))
            .expect("client reader dropped");
    }

    /// Next frame sent by the client, parsed as JSON.
    pub async fn next_sent_json(&mut self) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), self.sent.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client writer dropped");
        match msg {
            Message::Text(text) => serde_json::from_str(&text).expect("client frame is not JSON"),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

type Session = (
    mpsc::UnboundedReceiver<std::result::Result<Message, tungstenite::Error>>,
    mpsc::UnboundedSender<Message>,
);

#[derive(Default)]
struct Script {
    failures: AtomicUsize,
    attempts: AtomicUsize,
    sessions: Mutex<VecDeque<Session>>,
}

/// Dialer that fails a configured number of times, then hands out queued
/// in-memory connections. Clones share the same script.
#[derive(Clone, Default)]
pub struct ScriptedDialer {
    script: Arc<Script>,
}

impl ScriptedDialer {
    /// A dialer whose first `failures` attempts are refused.
    pub fn failing(failures: usize) -> Self {
        let dialer = Self::default();
        dialer.script.failures.store(failures, Ordering::SeqCst);
        dialer
    }

    /// Queues a connection for a future successful dial.
    pub fn add_session(&self) -> FakeServer {
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        self.script
            .sessions
            .lock()
            .unwrap()
            .push_back((frames_rx, sent_tx));
        FakeServer {
            frames: frames_tx,
            sent: sent_rx,
        }
    }

    /// Number of dial attempts so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.script.attempts.load(Ordering::SeqCst)
    }
}

fn refused() -> BridgeError {
    BridgeError::WebSocket(tungstenite::Error::ConnectionClosed)
}

impl Dialer for ScriptedDialer {
    async fn dial(&self, _url: &str) -> Result<(WsWriter, WsReader)> {
        // Let observers see `Connecting` before the outcome lands.
        tokio::task::yield_now().await;
        self.script.attempts.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .script
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(refused());
        }

        let Some((frames, sent)) = self.script.sessions.lock().unwrap().pop_front() else {
            return Err(refused());
        };

        let writer = sink::unfold(sent, |sent, msg: Message| async move {
            sent.send(msg)
                .map_err(|_| tungstenite::Error::ConnectionClosed)?;
            Ok::<_, tungstenite::Error>(sent)
        });
        let reader = stream::unfold(frames, |mut frames| async move {
            frames.recv().await.map(|item| (item, frames))
        });

        Ok((Box::pin(writer), Box::pin(reader)))
    }
}

/// Dialer that never completes, for exercising the connect timeout.
#[derive(Clone, Copy, Default)]
pub struct HangingDialer;

impl Dialer for HangingDialer {
    async fn dial(&self, _url: &str) -> Result<(WsWriter, WsReader)> {
        std::future::pending().await
    }
}

/// Waits until the stream reports `target`.
pub async fn wait_for_state(handle: &StreamHandle, target: StreamState) {
    let mut state = handle.watch_state();
    tokio::time::timeout(Duration::from_secs(5), state.wait_for(|s| *s == target))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {target:?}"))
        .expect("stream task dropped its state");
}

/// Polls `condition` until it holds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// One private API call as the exchange received it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub headers: HeaderMap,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Decoded form fields of the body.
    pub fn form(&self) -> BTreeMap<String, String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .into_owned()
            .collect()
    }
}

#[derive(Clone)]
struct Recorder {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    reply: &'static str,
}

async fn record(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    recorder
        .requests
        .lock()
        .unwrap()
        .push(CapturedRequest { headers, body });
    ([(header::CONTENT_TYPE, "application/json")], recorder.reply)
}

/// `/tapi` stand-in that records every request verbatim and answers each
/// with the same body.
pub struct CaptureExchange {
    pub url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CaptureExchange {
    pub async fn start(reply: &'static str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().route("/tapi", post(record)).with_state(Recorder {
            requests: Arc::clone(&requests),
            reply,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            url: format!("http://{addr}/tapi"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}
