//! Uniform result envelope for callers that want plain JSON.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorKind, GatewayError};

/// `{"success": true, "payload": ...}` or
/// `{"success": false, "error_kind": ..., "error_code": ..., "error_message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Exchange code when one was supplied, otherwise the error kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl CallResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error_kind: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn err(error: &GatewayError) -> Self {
        let kind = error.kind();
        let message = match error {
            GatewayError::Exchange(e) => e.message().to_string(),
            other => other.to_string(),
        };
        Self {
            success: false,
            payload: None,
            error_kind: Some(kind),
            error_code: Some(
                error
                    .exchange_code()
                    .map_or_else(|| kind.to_string(), str::to_owned),
            ),
            error_message: Some(message),
        }
    }
}

impl From<Result<Value, GatewayError>> for CallResult {
    fn from(result: Result<Value, GatewayError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(e) => Self::err(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExchangeError, Rejection};
    use idx_core::ValidationError;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let result = CallResult::from(Ok(json!({"order_id": 7})));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "payload": {"order_id": 7}})
        );
    }

    #[test]
    fn test_exchange_failure_keeps_code_and_message() {
        let err = GatewayError::from(ExchangeError::Unrecognized(Rejection::new(
            Some("under_maintenance".into()),
            "Maintenance window",
        )));
        let value = serde_json::to_value(CallResult::err(&err)).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "error_kind": "unrecognized",
                "error_code": "under_maintenance",
                "error_message": "Maintenance window"
            })
        );
    }

    #[test]
    fn test_local_failure_uses_kind_as_code() {
        let err = GatewayError::from(ValidationError::MissingParameter("pair".into()));
        let result = CallResult::err(&err);
        assert_eq!(result.error_code.as_deref(), Some("missing_parameter"));
        assert!(result.error_message.unwrap().contains("pair"));
    }
}
