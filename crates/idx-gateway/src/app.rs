//! Wires configuration, credentials and transport into a gateway.

use std::sync::Arc;

use idx_auth::{Credential, NonceSequencer};
use idx_client::{CallOptions, CallResult, Gateway, HttpTransport};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};

/// Build a live gateway from configuration.
pub fn build_gateway(config: &GatewayConfig, credential: &Credential) -> AppResult<Gateway> {
    let transport = HttpTransport::new(config.http_config(), credential)?;
    let gateway = Gateway::new(
        credential,
        Arc::new(NonceSequencer::with_system_clock()),
        Arc::new(transport),
    )
    .with_retry_policy(config.retry_policy());

    info!(
        private_url = %config.private_url,
        public_url = %config.public_url,
        timeout_ms = config.timeout_ms,
        max_attempts = config.retry.max_attempts,
        "Gateway ready"
    );
    Ok(gateway)
}

/// Parse the JSON argument object given on the command line.
pub fn parse_args(raw: Option<&str>) -> AppResult<Map<String, Value>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Arguments(format!(
                "expected a JSON object, got {other}"
            ))),
        },
    }
}

/// Run one call, cancelling on `cancel`, and wrap the outcome.
pub async fn run_call(
    gateway: &Gateway,
    operation: &str,
    args: &Map<String, Value>,
    options: CallOptions,
    sync_nonce: bool,
    cancel: CancellationToken,
) -> CallResult {
    if sync_nonce {
        if let Err(e) = gateway.sync_nonce().await {
            warn!(error = %e, "Nonce sync failed, continuing with local clock");
        }
    }

    gateway
        .call_cancellable(operation, args, options, cancel)
        .await
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        assert!(parse_args(None).unwrap().is_empty());
        assert!(parse_args(Some("  ")).unwrap().is_empty());

        let map = parse_args(Some(r#"{"pair": "btc_idr"}"#)).unwrap();
        assert_eq!(map["pair"], "btc_idr");
    }

    #[test]
    fn test_parse_args_rejects_non_object() {
        assert!(matches!(parse_args(Some("[1, 2]")), Err(AppError::Arguments(_))));
        assert!(matches!(parse_args(Some("{oops")), Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn test_run_call_validation_failure() {
        let credential = Credential::new("KEY", "secret");
        let gateway = build_gateway(&GatewayConfig::default(), &credential).unwrap();

        let result = run_call(
            &gateway,
            "order/place",
            &Map::new(),
            CallOptions::default(),
            false,
            CancellationToken::new(),
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("missing_parameter"));
    }
}
