//! Web application router and middleware setup.

use crate::exposition::MetricsSink;
use crate::web::config::WebConfig;
use crate::web::handlers::{self, AppState};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the axum application serving `sink`.
pub fn create_app(config: &WebConfig, sink: Arc<MetricsSink>) -> Router {
    let state = AppState {
        sink,
        metrics_path: config.metrics_path.clone(),
    };

    Router::new()
        .route(&config.metrics_path, get(handlers::get_metrics))
        .route("/api/health", get(handlers::health_check))
        .route("/", get(handlers::index))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
