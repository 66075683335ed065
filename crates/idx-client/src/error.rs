//! Client error types.
//!
//! Every failure path ends in a [`GatewayError`], and every
//! `GatewayError` maps to one flat [`ErrorKind`] so callers can branch
//! without matching nested enums.

use std::fmt;

use idx_core::{Operation, ValidationError};
use serde::Serialize;
use thiserror::Error;

/// Network-level failure of a single attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("Undecodable response body: {0}")]
    Decode(String),

    #[error("Request could not be built: {0}")]
    Build(String),

    /// Redirect, body or other request failure after the connection
    /// was established.
    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Whether a fresh attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_builder() {
            Self::Build(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Original code and message of an exchange rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: Option<String>,
    pub message: String,
}

impl Rejection {
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Well-formed rejection from the exchange. Never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(Rejection),

    #[error("Invalid pair: {0}")]
    InvalidPair(Rejection),

    #[error("Order not found: {0}")]
    OrderNotFound(Rejection),

    #[error("Rate limited: {0}")]
    RateLimited(Rejection),

    /// Bad credentials, signature or nonce. Points at a signing or
    /// sequencing defect rather than a market condition.
    #[error("Invalid nonce or signature: {0}")]
    InvalidSignature(Rejection),

    #[error("Unrecognized exchange error: {0}")]
    Unrecognized(Rejection),
}

impl ExchangeError {
    pub fn rejection(&self) -> &Rejection {
        match self {
            Self::InsufficientBalance(r)
            | Self::InvalidPair(r)
            | Self::OrderNotFound(r)
            | Self::RateLimited(r)
            | Self::InvalidSignature(r)
            | Self::Unrecognized(r) => r,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.rejection().code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.rejection().message
    }
}

/// Any failure of a gateway call.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// Caller input rejected locally; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport failed after {attempts} attempt(s): {source}")]
    TransportFailure {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Exchange rejected request: {0}")]
    Exchange(#[from] ExchangeError),

    /// Cancelled locally after the request was dispatched. The exchange
    /// may still have executed it.
    #[error("Outcome of {operation} unknown: cancelled locally after dispatch with nonce {nonce}")]
    OutcomeUnknown { operation: Operation, nonce: u64 },

    /// Cancelled locally before anything was dispatched.
    #[error("{operation} cancelled before dispatch")]
    Cancelled { operation: Operation },
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(e) => match e {
                ValidationError::UnknownOperation(_) => ErrorKind::UnknownOperation,
                ValidationError::MissingParameter(_) => ErrorKind::MissingParameter,
                ValidationError::InvalidType { .. } => ErrorKind::InvalidType,
                ValidationError::InvalidCombination(_) => ErrorKind::InvalidCombination,
                ValidationError::OutOfRange { .. } => ErrorKind::OutOfRange,
                ValidationError::UnknownParameter { .. } => ErrorKind::UnknownParameter,
            },
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            Self::Exchange(e) => match e {
                ExchangeError::InsufficientBalance(_) => ErrorKind::InsufficientBalance,
                ExchangeError::InvalidPair(_) => ErrorKind::InvalidPair,
                ExchangeError::OrderNotFound(_) => ErrorKind::OrderNotFound,
                ExchangeError::RateLimited(_) => ErrorKind::RateLimited,
                ExchangeError::InvalidSignature(_) => ErrorKind::InvalidSignature,
                ExchangeError::Unrecognized(_) => ErrorKind::Unrecognized,
            },
            Self::OutcomeUnknown { .. } => ErrorKind::OutcomeUnknown,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Exchange error code, when the exchange supplied one.
    pub fn exchange_code(&self) -> Option<&str> {
        match self {
            Self::Exchange(e) => e.code(),
            _ => None,
        }
    }
}

/// Flat error discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownOperation,
    MissingParameter,
    InvalidType,
    InvalidCombination,
    OutOfRange,
    UnknownParameter,
    TransportFailure,
    ProtocolViolation,
    InsufficientBalance,
    InvalidPair,
    OrderNotFound,
    RateLimited,
    InvalidSignature,
    Unrecognized,
    OutcomeUnknown,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownOperation => "unknown_operation",
            Self::MissingParameter => "missing_parameter",
            Self::InvalidType => "invalid_type",
            Self::InvalidCombination => "invalid_combination",
            Self::OutOfRange => "out_of_range",
            Self::UnknownParameter => "unknown_parameter",
            Self::TransportFailure => "transport_failure",
            Self::ProtocolViolation => "protocol_violation",
            Self::InsufficientBalance => "insufficient_balance",
            Self::InvalidPair => "invalid_pair",
            Self::OrderNotFound => "order_not_found",
            Self::RateLimited => "rate_limited",
            Self::InvalidSignature => "invalid_signature",
            Self::Unrecognized => "unrecognized",
            Self::OutcomeUnknown => "outcome_unknown",
            Self::Cancelled => "cancelled",
        }
    }

    /// Failure happened before anything reached the network.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation
                | Self::MissingParameter
                | Self::InvalidType
                | Self::InvalidCombination
                | Self::OutOfRange
                | Self::UnknownParameter
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_transport_errors() {
        assert!(TransportError::Timeout("t".into()).is_retryable());
        assert!(TransportError::Connection("reset".into()).is_retryable());
        assert!(!TransportError::RateLimited.is_retryable());
        assert!(!TransportError::Decode("x".into()).is_retryable());
        assert!(!TransportError::Status {
            status: 500,
            body: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_kind_mapping() {
        let err: GatewayError = ValidationError::MissingParameter("pair".into()).into();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert!(err.kind().is_validation());

        let err: GatewayError =
            ExchangeError::InvalidSignature(Rejection::new(Some("invalid_credentials".into()), "x"))
                .into();
        assert_eq!(err.kind(), ErrorKind::InvalidSignature);
        assert_eq!(err.exchange_code(), Some("invalid_credentials"));
        assert!(!err.kind().is_validation());
    }

    #[test]
    fn test_kind_display_is_snake_case() {
        assert_eq!(ErrorKind::InsufficientBalance.to_string(), "insufficient_balance");
        assert_eq!(ErrorKind::OutcomeUnknown.to_string(), "outcome_unknown");
    }

    #[test]
    fn test_kind_display_matches_serde() {
        let kinds = [
            ErrorKind::UnknownOperation,
            ErrorKind::MissingParameter,
            ErrorKind::InvalidType,
            ErrorKind::InvalidCombination,
            ErrorKind::OutOfRange,
            ErrorKind::UnknownParameter,
            ErrorKind::TransportFailure,
            ErrorKind::ProtocolViolation,
            ErrorKind::InsufficientBalance,
            ErrorKind::InvalidPair,
            ErrorKind::OrderNotFound,
            ErrorKind::RateLimited,
            ErrorKind::InvalidSignature,
            ErrorKind::Unrecognized,
            ErrorKind::OutcomeUnknown,
            ErrorKind::Cancelled,
        ];
        for kind in kinds {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn test_builder_error_not_retryable() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err = TransportError::from(err);
        assert!(matches!(err, TransportError::Build(_)));
        assert!(!err.is_retryable());
        assert!(!TransportError::Request("redirect loop".into()).is_retryable());
    }

    #[test]
    fn test_rejection_display_keeps_code() {
        let rejection = Rejection::new(Some("weird_code".into()), "Something odd");
        assert_eq!(rejection.to_string(), "[weird_code] Something odd");
        let err = ExchangeError::Unrecognized(rejection);
        assert!(err.to_string().contains("weird_code"));
        assert_eq!(err.message(), "Something odd");
    }
}
