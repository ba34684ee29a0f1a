//! HTTP serving of the metrics endpoint.
//!
//! Each request to the metrics path triggers exactly one collection pass;
//! nothing is cached between scrapes.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{ExporterError, Result};
use crate::exposition::MetricsSink;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

/// Serve `sink` until Ctrl+C is received.
pub async fn start_web_server(config: WebConfig, sink: MetricsSink) -> Result<()> {
    let app = create_app(&config, Arc::new(sink));

    let addr = config
        .bind_address()
        .parse::<SocketAddr>()
        .map_err(|e| ExporterError::config_error(format!("Invalid bind address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    info!(
        "Exporter running on http://{}{}",
        addr, config.metrics_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
