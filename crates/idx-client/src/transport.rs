//! Transport seam between the gateway and the exchange.
//!
//! [`HttpTransport`] talks to the live API over reqwest.
//! [`MockTransport`] replays scripted outcomes for tests.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use idx_auth::Credential;
use idx_core::SignedRequest;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::TransportError;

pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub type TransportResult = Result<RawResponse, TransportError>;

/// Default private trading API endpoint.
pub const DEFAULT_PRIVATE_URL: &str = "https://indodax.com/tapi";

/// Default public market-data API root.
pub const DEFAULT_PUBLIC_URL: &str = "https://indodax.com/api";

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded JSON body plus HTTP status of one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Delivers one signed request and returns the raw response.
///
/// Implementations perform exactly one attempt; retry policy lives in
/// the gateway.
pub trait Transport: Send + Sync {
    fn send(&self, request: SignedRequest) -> BoxFuture<'_, TransportResult>;
}

/// Arc wrapper for Transport trait objects.
pub type DynTransport = Arc<dyn Transport>;

/// Endpoints and timeout for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub private_url: String,
    pub public_url: String,
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            private_url: DEFAULT_PRIVATE_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
    config: HttpConfig,
    api_key: String,
}

impl HttpTransport {
    /// Create a transport that sends `credential`'s key in the `Key` header.
    pub fn new(config: HttpConfig, credential: &Credential) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Build(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            api_key: credential.key().to_string(),
        })
    }

    async fn dispatch(&self, request: SignedRequest) -> TransportResult {
        let builder = match &request.request.path {
            Some(path) => {
                let url = format!("{}/{}", self.config.public_url.trim_end_matches('/'), path);
                debug!(operation = %request.operation(), url = %url, "GET public endpoint");
                self.client.get(url)
            }
            None => {
                debug!(
                    operation = %request.operation(),
                    nonce = request.nonce(),
                    "POST private endpoint"
                );
                self.client
                    .post(&self.config.private_url)
                    .header("Key", &self.api_key)
                    .header("Sign", &request.signature)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(request.request.body)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }

        let bytes = response.bytes().await?;
        trace!(status = status.as_u16(), len = bytes.len(), "Response received");

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => Ok(RawResponse {
                status: status.as_u16(),
                body,
            }),
            Err(e) if status.is_success() => Err(TransportError::Decode(format!(
                "HTTP {} body is not JSON: {e}",
                status.as_u16()
            ))),
            Err(_) => Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).chars().take(256).collect(),
            }),
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: SignedRequest) -> BoxFuture<'_, TransportResult> {
        Box::pin(self.dispatch(request))
    }
}

/// Scripted transport for tests.
///
/// Returns queued outcomes in order and records every request it was
/// handed. An empty queue yields a connection error.
#[derive(Debug, Default)]
pub struct MockTransport {
    sends: parking_lot::Mutex<Vec<SignedRequest>>,
    script: parking_lot::Mutex<VecDeque<TransportResult>>,
    delay: parking_lot::Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome.
    pub fn push(&self, result: TransportResult) {
        self.script.lock().push_back(result);
    }

    /// Queue a successful response with the given body.
    pub fn push_body(&self, body: Value) {
        self.push(Ok(RawResponse::ok(body)));
    }

    /// Hold every send for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Get recorded sends.
    pub fn get_sends(&self) -> Vec<SignedRequest> {
        self.sends.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sends.lock().len()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: SignedRequest) -> BoxFuture<'_, TransportResult> {
        Box::pin(async move {
            self.sends.lock().push(request);
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| Err(TransportError::Connection("no scripted response".into())))
        })
    }
}
