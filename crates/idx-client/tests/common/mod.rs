//! Fake exchange for integration tests.
//!
//! Serves `/tapi` (private, signed) and `/api/...` (public) on an
//! ephemeral port, verifies the `Key` and `Sign` headers, and records
//! every private body it receives.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const API_KEY: &str = "FAKE-KEY-0001";
pub const API_SECRET: &str = "fake-exchange-secret";

struct FakeState {
    bodies: Mutex<Vec<String>>,
}

pub struct FakeExchange {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeExchange {
    /// Start the fake exchange on an available port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            bodies: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/tapi", post(private_api))
            .route("/slow/tapi", post(slow_private_api))
            .route("/loop/tapi", post(looping_private_api))
            .route("/api/{*path}", get(public_api))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn private_url(&self) -> String {
        format!("http://{}/tapi", self.addr)
    }

    pub fn slow_private_url(&self) -> String {
        format!("http://{}/slow/tapi", self.addr)
    }

    /// Endpoint that redirects to itself forever.
    pub fn looping_private_url(&self) -> String {
        format!("http://{}/loop/tapi", self.addr)
    }

    pub fn public_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Private bodies received so far.
    pub fn bodies(&self) -> Vec<String> {
        self.state.bodies.lock().clone()
    }
}

/// Value of `key` in a form body.
pub fn form_value(body: &str, key: &str) -> Option<String> {
    body.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_string())
    })
}

async fn private_api(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    state.bodies.lock().push(body.clone());

    let key = headers.get("key").and_then(|v| v.to_str().ok());
    let sign = headers.get("sign").and_then(|v| v.to_str().ok());
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let expected = idx_auth::sign(API_SECRET, body.as_bytes());

    if key != Some(API_KEY)
        || sign != Some(expected.as_str())
        || content_type != "application/x-www-form-urlencoded"
    {
        return Json(json!({
            "success": 0,
            "error": "Invalid credentials. API not found or session has expired.",
            "error_code": "invalid_credentials"
        }));
    }

    match form_value(&body, "method").as_deref() {
        Some("getInfo") => Json(json!({
            "success": 1,
            "return": {
                "server_time": 1_700_000_000,
                "balance": {"idr": "1000000", "btc": "0.5"}
            }
        })),
        Some("trade") => Json(json!({"success": 0, "error": "Insufficient balance."})),
        Some("getOrder") => Json(json!({
            "success": 0,
            "error": "Order not found",
            "error_code": "order_not_found"
        })),
        _ => Json(json!({
            "success": 0,
            "error": "Invalid method",
            "error_code": "invalid_method"
        })),
    }
}

async fn slow_private_api(State(state): State<Arc<FakeState>>, body: String) -> Json<Value> {
    state.bodies.lock().push(body);
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({"success": 1, "return": {}}))
}

async fn looping_private_api() -> Redirect {
    Redirect::temporary("/loop/tapi")
}

async fn public_api(Path(path): Path<String>) -> Response {
    match path.as_str() {
        "ticker/btcidr" => Json(json!({
            "ticker": {"high": "1100", "low": "900", "last": "1000", "server_time": 1_700_000_000}
        }))
        .into_response(),
        "server_time" => Json(json!({"timezone": "UTC", "server_time": 1_700_000_000_000u64})).into_response(),
        "ticker/dogeidr" => (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response(),
        "ticker/ethidr" => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "invalid_pair", "error_description": "Invalid Pair"})),
        )
            .into_response(),
    }
}
