//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,idx=debug";

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// JSON when `RUST_ENV=production`, pretty otherwise.
    pub fn from_env() -> Self {
        let is_production = std::env::var("RUST_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        if is_production {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Initialize structured logging.
///
/// Logs go to stderr so stdout stays free for command output.
pub fn init_logging(format: LogFormat) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_error() {
        // Whichever call runs first installs the global subscriber.
        let _ = init_logging(LogFormat::Pretty);
        let err = init_logging(LogFormat::Json).unwrap_err();
        assert!(matches!(err, TelemetryError::LoggingInit(_)));
    }
}
