use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use peerlink_gateway::logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
use peerlink_gateway::{serve, GatewayConfig, GatewayState, InMemoryCallStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Call signaling relay and call-state gateway
#[derive(Debug, Parser)]
#[command(name = "peerlink-gateway", version, about)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "PEERLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the configuration
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level, overrides the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_address = bind;
    }

    let mut logging = LoggingConfig::from_settings(&config.logging)?;
    if let Some(level) = cli.log_level.as_deref() {
        logging = logging.with_level(parse_log_level(level)?);
    }
    if cli.json_logs {
        logging = logging.with_json();
    }
    setup_logging(&logging)?;
    log_welcome(&logging.app_name, env!("CARGO_PKG_VERSION"));

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("binding {}", config.bind_address))?;
    let state = GatewayState::new(config, Arc::new(InMemoryCallStore::new()));

    serve(listener, state, shutdown_signal()).await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for ctrl-c, shutting down");
    }
}
