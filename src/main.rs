//! Catalog gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 CATALOG GATEWAY                   │
//!                      │                                                   │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│  fetch   │───▶│  TTL cache  │  │
//!                      │  │ server  │    │ context  │    │ + last-valid│  │
//!                      │  └─────────┘    └────┬─────┘    └─────────────┘  │
//!                      │                      │ miss                       │
//!                      │                      ▼                            │
//!                      │               ┌──────────────┐                    │
//!                      │               │   breaker    │                    │
//!                      │               │ retry/backoff│                    │
//!                      │               └──────┬───────┘                    │
//!                      │                      ▼                            │
//!   Client Response    │  ┌─────────┐    ┌──────────┐                      │
//!   ◀──────────────────┼──│ catalog │◀───│ upstream │◀─────────────────────┼── Upstream API
//!                      │  │validate │    │  client  │                      │
//!                      │  └─────────┘    └──────────┘                      │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use catalog_gateway::config::{load_config, GatewayConfig};
use catalog_gateway::fetch::RetryingFetcher;
use catalog_gateway::http::GatewayServer;
use catalog_gateway::lifecycle::{wait_for_signal, Shutdown};
use catalog_gateway::observability::{init_logging, metrics};
use catalog_gateway::upstream::{FaultInjectingUpstream, HttpUpstream, UpstreamSource};

#[derive(Parser)]
#[command(name = "catalog-gateway")]
#[command(about = "Resilient caching gateway for an upstream catalog API", long_about = None)]
struct Args {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "catalog-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        cache_ttl_secs = config.cache.default_ttl_secs,
        max_attempts = config.retries.max_attempts,
        failure_threshold = config.circuit_breaker.failure_threshold,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let http = HttpUpstream::from_config(&config.upstream)?;
    let upstream: Arc<dyn UpstreamSource> = if config.upstream.inject_faults {
        tracing::warn!("Fault injection enabled, upstream records will be corrupted");
        Arc::new(FaultInjectingUpstream::new(http))
    } else {
        Arc::new(http)
    };
    let fetcher = Arc::new(RetryingFetcher::new(upstream, &config));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    GatewayServer::new(config, fetcher)
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
