//! HTTP handlers for the exporter endpoints.

use crate::exposition::MetricsSink;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<MetricsSink>,
    pub metrics_path: String,
}

/// Run one collection pass and return it in the text exposition format.
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match state.sink.render().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, state.sink.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "jetson-stats-exporter",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Landing page pointing at the metrics endpoint.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html><head><title>Jetson Stats Exporter</title></head>\
         <body><h1>Jetson Stats Exporter</h1>\
         <p><a href=\"{path}\">{path}</a></p></body></html>",
        path = state.metrics_path
    ))
}
