//! Response normalization.
//!
//! Turns a raw exchange body into either the success payload or a typed
//! [`ExchangeError`]. Private responses use the `{success, return}` /
//! `{success, error, error_code}` envelope. Public responses carry no
//! envelope and signal failure with an `error` key.

use idx_core::Endpoint;
use serde_json::Value;

use crate::error::{ExchangeError, GatewayError, GatewayResult, Rejection};
use crate::transport::RawResponse;

/// Normalize one raw response from `endpoint`.
pub fn normalize(endpoint: Endpoint, raw: RawResponse) -> GatewayResult<Value> {
    let RawResponse { status, body } = raw;
    let mut map = match body {
        Value::Object(map) => map,
        other => {
            return match endpoint {
                Endpoint::Public if (200..300).contains(&status) => Ok(other),
                _ => Err(GatewayError::ProtocolViolation(format!(
                    "HTTP {status}: expected a JSON object, got {}",
                    kind_of(&other)
                ))),
            };
        }
    };

    match endpoint {
        Endpoint::Private => {
            let success = map.get("success").map(parse_success).ok_or_else(|| {
                GatewayError::ProtocolViolation(format!("HTTP {status}: response has no success field"))
            })?;
            match success {
                Some(true) => map.remove("return").ok_or_else(|| {
                    GatewayError::ProtocolViolation("success response has no return payload".into())
                }),
                Some(false) => Err(private_rejection(&map).into()),
                None => Err(GatewayError::ProtocolViolation(format!(
                    "unrecognized success flag: {}",
                    map["success"]
                ))),
            }
        }
        Endpoint::Public => {
            if map.contains_key("error") {
                Err(public_rejection(&map).into())
            } else if (200..300).contains(&status) {
                Ok(Value::Object(map))
            } else {
                Err(GatewayError::ProtocolViolation(format!(
                    "HTTP {status} without an error description"
                )))
            }
        }
    }
}

/// `success` arrives as `1`/`0`, `true`/`false` or `"1"`/`"0"`.
fn parse_success(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

const NO_MESSAGE: &str = "exchange reported failure without a message";

/// `{error: <message>, error_code: <code>}`.
fn private_rejection(map: &serde_json::Map<String, Value>) -> ExchangeError {
    let code = map.get("error_code").and_then(text).filter(|c| !c.is_empty());
    let message = map
        .get("error")
        .and_then(text)
        .unwrap_or_else(|| NO_MESSAGE.to_string());
    classify(code, message)
}

/// `{error: <code>, error_description: <message>}`, or a bare
/// `{error: <message>}` when no description is given.
fn public_rejection(map: &serde_json::Map<String, Value>) -> ExchangeError {
    let error = map.get("error").and_then(text).filter(|e| !e.is_empty());
    match map.get("error_description").and_then(text) {
        Some(description) => classify(error, description),
        None => classify(None, error.unwrap_or_else(|| NO_MESSAGE.to_string())),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map an exchange code and message to a typed error.
///
/// The code decides when it is known. Otherwise the message is matched
/// case-insensitively. Anything else keeps its original code.
pub fn classify(code: Option<String>, message: String) -> ExchangeError {
    type Ctor = fn(Rejection) -> ExchangeError;

    let by_code: Option<Ctor> = code.as_deref().and_then(|c| {
        Some(match c.to_ascii_lowercase().as_str() {
            "insufficient_balance" | "insufficient_fund" | "insufficient_funds" => {
                ExchangeError::InsufficientBalance as Ctor
            }
            "invalid_pair" | "pair_not_found" => ExchangeError::InvalidPair,
            "order_not_found" => ExchangeError::OrderNotFound,
            "too_many_requests" | "rate_limit" | "rate_limited" => ExchangeError::RateLimited,
            "invalid_credentials" | "bad_sign" | "invalid_signature" | "invalid_nonce" => {
                ExchangeError::InvalidSignature
            }
            _ => return None,
        })
    });

    let ctor = by_code.unwrap_or_else(|| {
        let lower = message.to_ascii_lowercase().replace('_', " ");
        if lower.contains("insufficient balance") || lower.contains("insufficient fund") {
            ExchangeError::InsufficientBalance as Ctor
        } else if lower.contains("invalid pair") {
            ExchangeError::InvalidPair
        } else if lower.contains("order not found") {
            ExchangeError::OrderNotFound
        } else if lower.contains("too many requests") || lower.contains("rate limit") {
            ExchangeError::RateLimited
        } else if lower.contains("invalid credentials")
            || lower.contains("bad sign")
            || lower.contains("invalid signature")
            || lower.contains("nonce")
        {
            ExchangeError::InvalidSignature
        } else {
            ExchangeError::Unrecognized
        }
    });

    ctor(Rejection::new(code, message))
}
