//! Indodax gateway - command-line entry point.
//!
//! Prints the operation catalog or performs one call and writes the
//! result envelope to stdout as JSON.

use anyhow::Result;
use clap::{Parser, Subcommand};
use idx_client::CallOptions;
use idx_telemetry::{init_logging, LogFormat};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Indodax exchange gateway
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via IDX_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every operation
    List,

    /// Print the parameter schema of one operation, or all of them
    Describe {
        /// Operation name, e.g. order/place
        operation: Option<String>,
    },

    /// Perform one call
    Call {
        /// Operation name, e.g. account/info
        operation: String,

        /// Arguments as a JSON object
        args: Option<String>,

        /// Permit transport retries for non-idempotent operations
        #[arg(long)]
        allow_retry: bool,

        /// Align the nonce with the exchange clock first
        #[arg(long)]
        sync_nonce: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LogFormat::from_env())?;

    match args.command {
        Command::List => print_json(&idx_gateway::describe::list())?,
        Command::Describe { operation } => {
            let schema = match operation {
                Some(name) => idx_gateway::describe::describe(&name)?,
                None => idx_gateway::describe::describe_all()?,
            };
            print_json(&schema)?;
        }
        Command::Call {
            operation,
            args: call_args,
            allow_retry,
            sync_nonce,
        } => {
            info!("Starting Indodax gateway v{}", env!("CARGO_PKG_VERSION"));

            // Determine config path: CLI arg > IDX_CONFIG env var > default
            let config_path = args
                .config
                .or_else(|| std::env::var("IDX_CONFIG").ok())
                .unwrap_or_else(|| "config/default.toml".to_string());
            info!(config_path = %config_path, "Loading configuration");

            let config = idx_gateway::GatewayConfig::load_or_default(&config_path)?;
            let credential = idx_gateway::load_credential(|name| std::env::var(name).ok())?;
            let gateway = idx_gateway::build_gateway(&config, &credential)?;
            let call_args = idx_gateway::parse_args(call_args.as_deref())?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, abandoning in-flight call");
                    on_signal.cancel();
                }
            });

            let result = idx_gateway::run_call(
                &gateway,
                &operation,
                &call_args,
                CallOptions { allow_retry },
                sync_nonce,
                cancel,
            )
            .await;

            print_json(&result)?;
            if !result.success {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
