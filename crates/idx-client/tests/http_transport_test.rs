//! End-to-end tests of the gateway over HTTP against a fake exchange.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{form_value, FakeExchange, API_KEY, API_SECRET};
use idx_auth::{Credential, NonceSequencer};
use idx_client::{
    ErrorKind, ExchangeError, Gateway, GatewayError, HttpConfig, HttpTransport, RetryPolicy,
    TransportError,
};
use serde_json::{json, Map, Value};
use tokio_test::{assert_err, assert_ok};

fn gateway(private_url: String, public_url: String, secret: &str) -> Gateway {
    let config = HttpConfig {
        private_url,
        public_url,
        timeout: Duration::from_millis(300),
    };
    let credential = Credential::new(API_KEY, secret);
    let transport = HttpTransport::new(config, &credential).unwrap();
    Gateway::new(
        &credential,
        Arc::new(NonceSequencer::with_system_clock()),
        Arc::new(transport),
    )
    .with_retry_policy(RetryPolicy {
        max_attempts: 2,
        backoff: Duration::from_millis(10),
    })
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn signed_request_accepted() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let payload = assert_ok!(gw.call("account/info", &Map::new()).await);
    assert_eq!(payload["balance"]["idr"], "1000000");

    let bodies = exchange.bodies();
    assert_eq!(bodies.len(), 1);
    assert_eq!(form_value(&bodies[0], "method").as_deref(), Some("getInfo"));
    assert!(form_value(&bodies[0], "nonce").is_some());
}

#[tokio::test]
async fn wrong_secret_is_invalid_signature() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), "not-the-secret");

    let err = assert_err!(gw.call("account/info", &Map::new()).await);
    assert_eq!(err.kind(), ErrorKind::InvalidSignature);
    assert_eq!(err.exchange_code(), Some("invalid_credentials"));
}

#[tokio::test]
async fn trade_rejection_preserves_message() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(
        gw.call(
            "order/place",
            &args(json!({"pair": "btc_idr", "side": "buy", "price": 500000000, "notional": 50000})),
        )
        .await
    );
    match err {
        GatewayError::Exchange(ExchangeError::InsufficientBalance(rejection)) => {
            assert_eq!(rejection.message, "Insufficient balance.");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let body = &exchange.bodies()[0];
    assert_eq!(form_value(body, "method").as_deref(), Some("trade"));
    assert_eq!(form_value(body, "type").as_deref(), Some("buy"));
    assert_eq!(form_value(body, "idr").as_deref(), Some("50000"));
}

#[tokio::test]
async fn order_not_found_by_code() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(
        gw.call("order/get", &args(json!({"pair": "btc_idr", "order_id": 12}))).await
    );
    assert_eq!(err.kind(), ErrorKind::OrderNotFound);
}

#[tokio::test]
async fn public_ticker_and_server_time() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let payload = assert_ok!(gw.call("ticker", &args(json!({"pair": "btc_idr"}))).await);
    assert_eq!(payload["ticker"]["last"], "1000");

    let before = gw.nonces().current();
    assert_ok!(gw.sync_nonce().await);
    assert!(gw.nonces().current() >= before);
    assert!(gw.nonces().current() >= 1_700_000_000_000);

    assert!(exchange.bodies().is_empty());
}

#[tokio::test]
async fn public_error_classified() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(gw.call("ticker", &args(json!({"pair": "xyz_idr"}))).await);
    assert_eq!(err.kind(), ErrorKind::InvalidPair);

    let err = assert_err!(gw.call("ticker", &args(json!({"pair": "doge_idr"}))).await);
    assert_eq!(err.kind(), ErrorKind::RateLimited);

    let err = assert_err!(gw.call("ticker", &args(json!({"pair": "eth_idr"}))).await);
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
}

#[tokio::test]
async fn timeout_retried_with_fresh_nonce() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.slow_private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(gw.call("account/info", &Map::new()).await);
    match err {
        GatewayError::TransportFailure { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(matches!(source, TransportError::Timeout(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let nonces: Vec<u64> = exchange
        .bodies()
        .iter()
        .filter_map(|b| form_value(b, "nonce"))
        .map(|n| n.parse().unwrap())
        .collect();
    assert_eq!(nonces.len(), 2);
    assert!(nonces[1] > nonces[0]);
}

#[tokio::test]
async fn placement_timeout_not_retried() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.slow_private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(
        gw.call(
            "order/place",
            &args(json!({"pair": "btc_idr", "side": "sell", "price": 500000000, "amount": "0.01"})),
        )
        .await
    );
    assert!(matches!(err, GatewayError::TransportFailure { attempts: 1, .. }));
    assert_eq!(exchange.bodies().len(), 1);
}

#[tokio::test]
async fn connection_refused_is_transport_failure() {
    let gw = gateway(
        "http://127.0.0.1:1/tapi".into(),
        "http://127.0.0.1:1/api".into(),
        API_SECRET,
    );
    let err = assert_err!(gw.call("account/info", &Map::new()).await);
    match err {
        GatewayError::TransportFailure { attempts, source } => {
            assert_eq!(attempts, 2);
            assert!(matches!(source, TransportError::Connection(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn redirect_loop_not_retried() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.looping_private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(gw.call("account/info", &Map::new()).await);
    match err {
        GatewayError::TransportFailure { attempts, source } => {
            assert_eq!(attempts, 1);
            assert!(matches!(source, TransportError::Request(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn public_rejection_keeps_code_and_description() {
    let exchange = FakeExchange::start().await;
    let gw = gateway(exchange.private_url(), exchange.public_url(), API_SECRET);

    let err = assert_err!(gw.call("ticker", &args(json!({"pair": "xyz_idr"}))).await);
    assert_eq!(err.exchange_code(), Some("invalid_pair"));
    match err {
        GatewayError::Exchange(e) => assert_eq!(e.message(), "Invalid Pair"),
        other => panic!("unexpected error: {other:?}"),
    }
}
