//! JSON request surface for the trading front-end.
//!
//! Routes:
//! - `POST /login`, `GET /logout` - session cookie management
//! - `GET /` - landing target after login; `204` for a live session
//! - `GET /api/orderbook` - latest order book snapshot
//! - `GET /api/open-orders`, `POST /api/trade`, `POST /api/cancel-order`
//!
//! Everything except `/login` requires a valid `session_id` cookie;
//! requests without one are redirected to `/login`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::bridge::Bridge;
use crate::models::trade::TradeRequest;
use crate::session::{SESSION_TTL, SessionStore};
use crate::{BridgeError, Result};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Login accepted by `POST /login`.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: Zeroizing<String>,
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub bridge: Arc<Bridge>,
    pub sessions: Arc<dyn SessionStore>,
    pub admin: Arc<AdminCredentials>,
}

impl AppState {
    #[must_use]
    pub fn new(bridge: Arc<Bridge>, sessions: Arc<dyn SessionStore>, admin: AdminCredentials) -> Self {
        Self {
            bridge,
            sessions,
            admin: Arc::new(admin),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    order_id: String,
}

/// Builds the router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(home))
        .route("/logout", get(logout))
        .route("/api/orderbook", get(order_book))
        .route("/api/open-orders", get(open_orders))
        .route("/api/trade", post(trade))
        .route("/api/cancel-order", post(cancel_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/login", post(login))
        .merge(protected)
        .with_state(state)
}

/// Serves the router on `listener` until the process exits.
///
/// # Errors
///
/// Returns [`BridgeError::Io`] if the server fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP server listening");
    }
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// `302 Found` to `location`.
fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": 0, "error": message}))).into_response()
}

/// Extracts the session token from the `Cookie` header.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

fn has_session(state: &AppState, headers: &HeaderMap) -> bool {
    session_token(headers).is_some_and(|token| state.sessions.validate(&token))
}

async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if has_session(&state, request.headers()) {
        next.run(request).await
    } else {
        found("/login")
    }
}

async fn login(State(state): State<AppState>, headers: HeaderMap, Form(form): Form<LoginForm>) -> Response {
    if has_session(&state, &headers) {
        return found("/");
    }

    if form.username != state.admin.username || form.password != *state.admin.password {
        warn!(username = %form.username, "Rejected login");
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }

    let token = state.sessions.create();
    let cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly",
        SESSION_TTL.as_secs()
    );
    info!(username = %form.username, "Login succeeded");

    let mut response = found("/");
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        Err(_) => failure(StatusCode::INTERNAL_SERVER_ERROR, "Could not create session"),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token);
    }

    let mut response = found("/login");
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session_id=; Path=/; Max-Age=0; HttpOnly"),
    );
    response
}

async fn home() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn order_book(State(state): State<AppState>) -> Response {
    let snapshot = state.bridge.order_book();
    Json(&*snapshot).into_response()
}

async fn open_orders(State(state): State<AppState>) -> Response {
    match state.bridge.open_orders().await {
        Ok(orders) => Json(json!({"success": 1, "orders": orders})).into_response(),
        Err(e) => {
            warn!(error = %e, "Listing open orders failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &e.user_message())
        }
    }
}

async fn trade(State(state): State<AppState>, payload: std::result::Result<Json<TradeRequest>, JsonRejection>) -> Response {
    let Ok(Json(request)) = payload else {
        return failure(StatusCode::BAD_REQUEST, "Invalid request format");
    };

    match state.bridge.place_trade(&request).await {
        Ok(placed) => Json(json!({"success": 1, "return": placed})).into_response(),
        Err(e @ BridgeError::Exchange(_)) => {
            info!(error = %e, "Trade rejected by exchange");
            failure(StatusCode::BAD_REQUEST, &e.user_message())
        }
        Err(e) => {
            warn!(error = %e, "Trade request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &e.user_message())
        }
    }
}

async fn cancel_order(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CancelRequest>, JsonRejection>,
) -> Response {
    let order_id = match payload {
        Ok(Json(CancelRequest { order_id })) if !order_id.is_empty() => order_id,
        _ => return failure(StatusCode::BAD_REQUEST, "Invalid request format"),
    };

    match state.bridge.cancel_order(&order_id).await {
        Ok(()) => Json(json!({"success": 1})).into_response(),
        Err(e) => {
            warn!(error = %e, order_id = %order_id, "Cancel request failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &e.user_message())
        }
    }
}
