//! # Failover Gateway
//!
//! Chat-completion gateway that routes each request to the highest priority
//! healthy AI provider, fails over on errors and answers locally when no
//! provider is reachable.
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! failover-gateway
//!
//! # Start with a custom config file
//! failover-gateway --config /path/to/config.yaml
//!
//! # Start with environment overrides
//! FAILOVER_PORT=9000 failover-gateway
//! ```

use anyhow::Context;
use failover_config::{ConfigLoader, GatewayConfig};
use failover_server::{AppState, Server, ServerConfig};
use failover_telemetry::{init_logging, LoggingConfig};
use std::env;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match load_config().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Initialize logging as soon as the level and format are known
    let logging = LoggingConfig::new()
        .with_level(&config.logging.level)
        .with_format_name(&config.logging.format)
        .and_then(|logging| init_logging(&logging));
    if let Err(e) = logging {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting failover gateway"
    );

    if let Err(e) = run(config).await {
        error!(error = %format!("{e:#}"), "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        providers = config.enabled_providers().count(),
        fault_injection = config.fault_injection.enabled,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config, |key| env::var(key).ok())
        .context("failed to build application state")?;

    info!(providers = state.tracker.len(), "Health tracker ready");

    Server::new(ServerConfig::from(&config.server), state)
        .run()
        .await
        .context("server error")?;

    info!("Failover gateway stopped");
    Ok(())
}

async fn load_config() -> anyhow::Result<GatewayConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path_arg(env::args().skip(1)) {
        loader = loader.with_path(path);
    }
    Ok(loader.load().await?)
}

/// Value of `--config <path>` or `--config=<path>`
fn config_path_arg(mut args: impl Iterator<Item = String>) -> Option<String> {
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next();
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(path.to_string());
        }
    }
    None
}
