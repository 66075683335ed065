//! Gateway: validate, sequence, sign, dispatch, normalize.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use idx_auth::{Clock, Credential, NonceSequencer, SystemClock};
use idx_core::{validate, Operation, ValidatedRequest};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::builder::RequestBuilder;
use crate::error::{ExchangeError, GatewayError, GatewayResult, Rejection, TransportError};
use crate::normalizer::normalize;
use crate::transport::{DynTransport, RawResponse};

/// Retry behaviour for transient transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Permit transport retries for non-idempotent operations.
    ///
    /// A retried placement can execute twice if the first attempt
    /// reached the exchange.
    pub allow_retry: bool,
}

/// Entry point for exchange calls.
///
/// Safe to share across tasks; every attempt draws its own nonce from
/// the shared sequencer.
pub struct Gateway<C: Clock = SystemClock> {
    builder: RequestBuilder,
    nonces: Arc<NonceSequencer<C>>,
    transport: DynTransport,
    retry: RetryPolicy,
}

impl<C: Clock> Gateway<C> {
    /// # Panics
    /// Panics if the credential secret is empty.
    pub fn new(credential: &Credential, nonces: Arc<NonceSequencer<C>>, transport: DynTransport) -> Self {
        Self {
            builder: RequestBuilder::new(credential.signer()),
            nonces,
            transport,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn nonces(&self) -> &NonceSequencer<C> {
        &self.nonces
    }

    pub async fn call(&self, operation: &str, args: &Map<String, Value>) -> GatewayResult<Value> {
        self.call_with(operation, args, CallOptions::default()).await
    }

    pub async fn call_with(
        &self,
        operation: &str,
        args: &Map<String, Value>,
        options: CallOptions,
    ) -> GatewayResult<Value> {
        let request = self.validate(operation, args)?;
        let in_flight = AtomicU64::new(0);
        self.dispatch(&request, options, &in_flight).await
    }

    /// Like [`call_with`](Self::call_with) but abandons the wait when
    /// `cancel` fires.
    ///
    /// Cancellation after dispatch yields [`GatewayError::OutcomeUnknown`]
    /// with the nonce of the last attempt; the caller must reconcile
    /// through a query before assuming anything.
    pub async fn call_cancellable(
        &self,
        operation: &str,
        args: &Map<String, Value>,
        options: CallOptions,
        cancel: CancellationToken,
    ) -> GatewayResult<Value> {
        let request = self.validate(operation, args)?;
        let operation = request.operation();
        let in_flight = AtomicU64::new(0);

        // A token that already fired must win over dispatch.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                match in_flight.load(Ordering::Acquire) {
                    0 => {
                        info!(operation = %operation, "Call cancelled before dispatch");
                        Err(GatewayError::Cancelled { operation })
                    }
                    nonce => {
                        warn!(
                            operation = %operation,
                            nonce,
                            "Call cancelled after dispatch; exchange outcome unknown"
                        );
                        Err(GatewayError::OutcomeUnknown { operation, nonce })
                    }
                }
            }
            result = self.dispatch(&request, options, &in_flight) => result,
        }
    }

    /// Align the nonce counter with the exchange clock.
    ///
    /// Returns the measured offset `server - local` in milliseconds.
    pub async fn sync_nonce(&self) -> GatewayResult<i64> {
        let payload = self.call(Operation::ServerTime.name(), &Map::new()).await?;
        let server_time = payload
            .get("server_time")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                GatewayError::ProtocolViolation("server_time missing from response".into())
            })?;

        let offset = self.nonces.sync_with_server(server_time);
        info!(offset_ms = offset, nonce = self.nonces.current(), "Nonce synced with server");
        Ok(offset)
    }

    fn validate(&self, operation: &str, args: &Map<String, Value>) -> GatewayResult<ValidatedRequest> {
        validate(operation, args).map_err(|e| {
            debug!(operation, error = %e, "Request rejected locally");
            GatewayError::from(e)
        })
    }

    async fn dispatch(
        &self,
        request: &ValidatedRequest,
        options: CallOptions,
        in_flight: &AtomicU64,
    ) -> GatewayResult<Value> {
        let operation = request.operation();
        let max_attempts = if operation.is_idempotent() || options.allow_retry {
            self.retry.max_attempts.max(1)
        } else {
            1
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let signed = self.builder.sign(request, self.nonces.next());
            let nonce = signed.nonce();
            in_flight.store(nonce, Ordering::Release);
            debug!(operation = %operation, nonce, attempt, "Dispatching request");

            match self.transport.send(signed).await {
                Ok(raw) => return self.finish(operation, nonce, raw),
                Err(TransportError::RateLimited) => {
                    warn!(operation = %operation, nonce, "Rate limited by exchange");
                    return Err(ExchangeError::RateLimited(Rejection::new(
                        Some("http_429".into()),
                        "HTTP 429 Too Many Requests",
                    ))
                    .into());
                }
                Err(TransportError::Decode(reason)) => {
                    return Err(GatewayError::ProtocolViolation(reason));
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    warn!(
                        operation = %operation,
                        nonce,
                        attempt,
                        error = %e,
                        "Transient transport failure, retrying with a fresh nonce"
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                Err(e) => {
                    if e.is_retryable() && !operation.is_idempotent() {
                        warn!(
                            operation = %operation,
                            nonce,
                            error = %e,
                            "Transport failed on a non-idempotent call; it may have executed"
                        );
                    }
                    return Err(GatewayError::TransportFailure {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    fn finish(&self, operation: Operation, nonce: u64, raw: RawResponse) -> GatewayResult<Value> {
        let result = normalize(operation.endpoint(), raw);
        match &result {
            Ok(_) => debug!(operation = %operation, nonce, "Call succeeded"),
            Err(GatewayError::Exchange(ExchangeError::InvalidSignature(rejection))) => error!(
                operation = %operation,
                nonce,
                code = ?rejection.code,
                message = %rejection.message,
                "Exchange rejected signature or nonce; check credentials and nonce sequencing"
            ),
            Err(e) => warn!(operation = %operation, nonce, error = %e, "Call failed"),
        }
        result
    }
}
