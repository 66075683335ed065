//! Indodax gateway application.
//!
//! Loads configuration and credentials, builds a [`idx_client::Gateway`]
//! and exposes the operation catalog to callers as JSON.

pub mod app;
pub mod config;
pub mod describe;
pub mod error;

pub use app::{build_gateway, parse_args, run_call};
pub use config::{load_credential, GatewayConfig};
pub use error::{AppError, AppResult};
