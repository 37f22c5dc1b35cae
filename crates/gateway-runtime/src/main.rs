//! # HeliosHash Gateway Runtime
//!
//! Entry point for the USSD/SMS voting gateway.
//!
//! ## Startup Sequence
//!
//! 1. Install logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from the environment
//! 3. Report production readiness and chain settings
//! 4. Serve until Ctrl+C, then drain background work

use anyhow::{Context, Result};
use hh_ussd_gateway::{GatewayConfig, UssdGatewayService, VERSION};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Wait for Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
    info!("Shutdown signal received");
}

fn report_config(config: &GatewayConfig) {
    if let Err(e) = config.validate_for_production() {
        warn!("{}", e);
    }

    info!(rpc = %config.chain.polygon_rpc, "Ledger RPC endpoint");
    if config.chain.oracle_key_configured {
        info!("Oracle wallet configured");
    } else {
        warn!("PRIVATE_KEY not set; votes are recorded locally only");
    }
    info!(origins = ?config.cors.allowed_origins, "CORS allowlist");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  HeliosHash USSD/SMS Gateway v{}", VERSION);
    info!("===========================================");

    // Load configuration
    let config = GatewayConfig::from_env();
    report_config(&config);

    let service = UssdGatewayService::new(config).context("Invalid gateway configuration")?;

    info!("Gateway is running. Press Ctrl+C to stop.");
    service
        .run(shutdown_signal())
        .await
        .context("Gateway terminated with an error")?;

    Ok(())
}
