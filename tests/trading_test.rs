//! Private API client tests against a mock `/tapi` endpoint.

mod common;

use std::time::Duration;

use httpmock::prelude::*;
use rust_decimal_macros::dec;
use tapi_bridge::BridgeError;
use tapi_bridge::auth::{encode_params, sign};
use tapi_bridge::models::trade::{OrderSide, TradeRequest};
use tapi_bridge::trading::{CANCEL_FAILED, OPEN_ORDERS_FAILED, TRADE_FAILED, TradingClient, TradingSettings};
use zeroize::Zeroizing;

use common::{CaptureExchange, CapturedRequest, OPEN_ORDERS, TRADE_SUCCESS, market};

const API_KEY: &str = "test-api-key";
const API_SECRET: &str = "test-api-secret";

fn client(api_url: String) -> TradingClient {
    TradingClient::new(TradingSettings {
        api_url,
        api_key: API_KEY.into(),
        api_secret: Zeroizing::new(API_SECRET.into()),
        market: market(),
        timeout: Duration::from_secs(5),
    })
    .expect("client builds")
}

async fn mock_tapi<'a>(server: &'a MockServer, status: u16, body: &str) -> httpmock::Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tapi")
                .header("Key", API_KEY)
                .header_exists("Sign")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(status)
                .header("content-type", "application/json")
                .body(body);
        })
        .await
}

#[tokio::test]
async fn test_place_trade_returns_exchange_details() {
    let server = MockServer::start_async().await;
    let mock = mock_tapi(&server, 200, TRADE_SUCCESS).await;

    let placed = client(server.url("/tapi"))
        .place_trade(&TradeRequest::buy_with_quote(dec!(41), dec!(100000)))
        .await
        .expect("trade succeeds");

    mock.assert_async().await;
    assert_eq!(placed.order_id().as_deref(), Some("11560"));
    assert_eq!(placed.details["spend_rp"], "100000");
}

#[tokio::test]
async fn test_exchange_rejection_carries_its_message() {
    let server = MockServer::start_async().await;
    mock_tapi(&server, 200, r#"{"success":0,"error":"Insufficient balance"}"#).await;

    let err = client(server.url("/tapi"))
        .place_trade(&TradeRequest::limit(OrderSide::Sell, dec!(45), dec!(3)))
        .await
        .unwrap_err();

    assert!(matches!(&err, BridgeError::Exchange(msg) if msg == "Insufficient balance"));
    assert!(!err.is_transport());
    assert_eq!(err.user_message(), "Insufficient balance");
}

#[tokio::test]
async fn test_rejection_without_message_uses_fallback() {
    let server = MockServer::start_async().await;
    mock_tapi(&server, 200, r#"{"success":0}"#).await;
    let client = client(server.url("/tapi"));

    let trade = client
        .place_trade(&TradeRequest::limit(OrderSide::Buy, dec!(40), dec!(1)))
        .await
        .unwrap_err();
    assert_eq!(trade.to_string(), TRADE_FAILED);

    let open = client.open_orders().await.unwrap_err();
    assert_eq!(open.to_string(), OPEN_ORDERS_FAILED);

    let cancel = client.cancel_order("1001").await.unwrap_err();
    assert_eq!(cancel.to_string(), CANCEL_FAILED);
}

#[tokio::test]
async fn test_open_orders_skips_incomplete_rows() {
    let server = MockServer::start_async().await;
    let mock = mock_tapi(&server, 200, OPEN_ORDERS).await;

    let orders = client(server.url("/tapi")).open_orders().await.expect("listing succeeds");

    mock.assert_async().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, "1001");
    assert_eq!(orders[0].side, "buy");
    assert!((orders[0].price - 40.0).abs() < f64::EPSILON);
    assert!((orders[0].amount - 250.5).abs() < f64::EPSILON);
    assert_eq!(orders[1].id, "1003");
    assert!((orders[1].price - 47.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_open_orders_without_orders_is_empty() {
    let server = MockServer::start_async().await;
    mock_tapi(&server, 200, r#"{"success":1,"return":{}}"#).await;

    let orders = client(server.url("/tapi")).open_orders().await.expect("listing succeeds");
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_cancel_order_succeeds() {
    let server = MockServer::start_async().await;
    let mock = mock_tapi(
        &server,
        200,
        r#"{"success":1,"return":{"order_id":1001,"type":"buy","balance":{"idr":"10000"}}}"#,
    )
    .await;

    client(server.url("/tapi"))
        .cancel_order("1001")
        .await
        .expect("cancel succeeds");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_undecodable_body_is_a_decode_error() {
    let server = MockServer::start_async().await;
    mock_tapi(&server, 502, "<html>Bad Gateway</html>").await;

    let err = client(server.url("/tapi")).open_orders().await.unwrap_err();

    assert!(matches!(err, BridgeError::Json(_)));
    assert!(!err.is_transport());
    assert_eq!(err.user_message(), "Unexpected response from exchange");
}

#[tokio::test]
async fn test_unreachable_endpoint_is_a_transport_error() {
    // Nothing listens on the discard port.
    let err = client("http://127.0.0.1:9/tapi".into())
        .cancel_order("1001")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Http(_)));
    assert!(err.is_transport());
    assert_eq!(err.user_message(), "Exchange is unreachable");
}

/// Checks the headers and signature of a captured call and returns its form.
fn verified_form(request: &CapturedRequest) -> std::collections::BTreeMap<String, String> {
    assert_eq!(request.header("Key"), Some(API_KEY));
    assert_eq!(
        request.header("content-type"),
        Some("application/x-www-form-urlencoded")
    );
    let expected = sign(API_SECRET, request.body.as_bytes());
    assert_eq!(request.header("Sign"), Some(expected.as_str()));

    let form = request.form();
    // Keys go out sorted, so re-encoding the fields reproduces the body.
    assert_eq!(request.body, encode_params(&form));
    assert_eq!(form.get("pair").map(String::as_str), Some("hnst_idr"));
    assert!(form["timestamp"].parse::<u128>().is_ok());
    form
}

#[tokio::test]
async fn test_quote_sized_buy_goes_out_signed() {
    let exchange = CaptureExchange::start(TRADE_SUCCESS).await;

    client(exchange.url.clone())
        .place_trade(&TradeRequest::buy_with_quote(dec!(41), dec!(100000)))
        .await
        .expect("trade succeeds");

    let requests = exchange.requests();
    assert_eq!(requests.len(), 1);
    let form = verified_form(&requests[0]);

    assert_eq!(form.get("method").map(String::as_str), Some("trade"));
    assert_eq!(form.get("type").map(String::as_str), Some("buy"));
    assert_eq!(form.get("price").map(String::as_str), Some("41.00000000"));
    assert_eq!(form.get("idr").map(String::as_str), Some("100000.00000000"));
    assert_eq!(form.get("order_type").map(String::as_str), Some("limit"));
    assert_eq!(form.get("time_in_force").map(String::as_str), Some("GTC"));
    assert!(!form.contains_key("hnst"));
    assert!(requests[0].body.contains("idr=100000.00000000"));
    assert!(!requests[0].body.contains("hnst="));
}

#[tokio::test]
async fn test_sell_goes_out_with_base_amount() {
    let exchange = CaptureExchange::start(TRADE_SUCCESS).await;

    client(exchange.url.clone())
        .place_trade(&TradeRequest::limit(OrderSide::Sell, dec!(45), dec!(3)))
        .await
        .expect("trade succeeds");

    let form = verified_form(&exchange.requests()[0]);
    assert_eq!(form.get("type").map(String::as_str), Some("sell"));
    assert_eq!(form.get("hnst").map(String::as_str), Some("3.00000000"));
    assert!(!form.contains_key("idr"));
}

#[tokio::test]
async fn test_cancel_goes_out_with_order_id() {
    let exchange = CaptureExchange::start(r#"{"success":1,"return":{"order_id":1001}}"#).await;

    client(exchange.url.clone())
        .cancel_order("1001")
        .await
        .expect("cancel succeeds");

    let form = verified_form(&exchange.requests()[0]);
    assert_eq!(form.get("method").map(String::as_str), Some("cancelOrder"));
    assert_eq!(form.get("order_id").map(String::as_str), Some("1001"));
}

#[tokio::test]
async fn test_open_orders_sends_only_common_params() {
    let exchange = CaptureExchange::start(OPEN_ORDERS).await;

    client(exchange.url.clone()).open_orders().await.expect("listing succeeds");

    let form = verified_form(&exchange.requests()[0]);
    assert_eq!(form.get("method").map(String::as_str), Some("openOrders"));
    assert_eq!(
        form.keys().map(String::as_str).collect::<Vec<_>>(),
        ["method", "pair", "timestamp"]
    );
}

#[tokio::test]
async fn test_each_call_gets_a_fresh_signature() {
    let exchange = CaptureExchange::start(OPEN_ORDERS).await;
    let client = client(exchange.url.clone());

    client.open_orders().await.expect("first call");
    tokio::time::sleep(Duration::from_millis(2)).await;
    client.open_orders().await.expect("second call");

    let requests = exchange.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        verified_form(request);
    }
    assert_ne!(requests[0].body, requests[1].body);
    assert_ne!(requests[0].header("Sign"), requests[1].header("Sign"));
}
