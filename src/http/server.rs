//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics)
//! - Serve on a bound listener until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::fetch::RetryingFetcher;
use crate::http::handlers::{get_health, get_status, get_summary, list_products};
use crate::http::request::{track_metrics, MakeRequestUuid, X_REQUEST_ID};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<RetryingFetcher>,
    /// Cache key the catalog routes fetch under.
    pub cache_key: Arc<str>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(fetcher: Arc<RetryingFetcher>, cache_key: impl Into<Arc<str>>) -> Self {
        Self {
            fetcher,
            cache_key: cache_key.into(),
            started_at: Instant::now(),
        }
    }
}

/// HTTP front end for the catalog gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new server around an existing fetch context.
    pub fn new(config: GatewayConfig, fetcher: Arc<RetryingFetcher>) -> Self {
        let state = AppState::new(fetcher, config.upstream.cache_key.as_str());
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The configured router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &GatewayConfig, state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/health", get(get_health))
        .route("/data/products", get(list_products))
        .route("/data/summary", get(get_summary))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
}
