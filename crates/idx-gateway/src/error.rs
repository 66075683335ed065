//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("Invalid arguments: {0}")]
    Arguments(String),

    #[error("Validation error: {0}")]
    Validation(#[from] idx_core::ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] idx_client::TransportError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] idx_telemetry::TelemetryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
