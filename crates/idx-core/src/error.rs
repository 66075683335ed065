//! Validation error types for idx-core.

use thiserror::Error;

/// Caller-input defects detected before anything reaches the network.
///
/// Rules are evaluated in declaration order and the first failure wins:
/// unknown operation, missing field, bad type, cross-field combination,
/// out-of-range value. Unknown extra arguments are reported last.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidType { field: String, reason: String },

    #[error("Invalid parameter combination: {0}")]
    InvalidCombination(String),

    #[error("Value out of range for {field}: {reason}")]
    OutOfRange { field: String, reason: String },

    #[error("Unknown parameter for {operation}: {field}")]
    UnknownParameter { operation: String, field: String },
}

impl ValidationError {
    pub(crate) fn invalid_type(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(field: &str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Field the error refers to, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingParameter(field) => Some(field),
            Self::InvalidType { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::UnknownParameter { field, .. } => Some(field),
            Self::UnknownOperation(_) | Self::InvalidCombination(_) => None,
        }
    }
}

/// Result type alias for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;
