use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use jetson_stats_exporter::{
    shared_source, web::create_app, JetsonCollector, MetricsSink, Snapshot, StaticSource,
    WebConfig,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn app_for(source: StaticSource, config: &WebConfig) -> Router {
    let mut sink = MetricsSink::new();
    JetsonCollector::register_with(shared_source(source), &mut sink);
    create_app(config, Arc::new(sink))
}

fn board_snapshot() -> Snapshot {
    Snapshot::from_json_str(
        &json!({
            "gpu": {"val": 25},
            "power": {"VDD_IN": 0, "VDD_CPU": 1500},
            "stats": {"uptime": 120}
        })
        .to_string(),
    )
    .expect("Should parse snapshot")
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .expect("Should get a response");

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    (status, content_type, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = app_for(StaticSource::new(board_snapshot()), &WebConfig::default());
    let (status, content_type, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap_or_default().starts_with("text/plain"));
    assert!(body.contains(r#"jetson_power{rail="vdd_cpu"} 1500"#));
    assert!(!body.contains("vdd_in"));
    assert!(body.contains("jetson_usage_gpu 25"));
    assert!(body.contains("jetson_uptime_seconds 120"));
}

#[tokio::test]
async fn test_custom_metrics_path() {
    let config = WebConfig::default().with_metrics_path("/scrape");
    let app = app_for(StaticSource::new(board_snapshot()), &config);

    let (status, _, body) = get(app.clone(), "/scrape").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("jetson_usage_gpu"));

    let (status, _, _) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_not_ready_source_serves_empty_scrape() {
    let app = app_for(StaticSource::not_ready(), &WebConfig::default());
    let (status, _, body) = get(app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app_for(StaticSource::not_ready(), &WebConfig::default());
    let (status, _, body) = get(app, "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body).expect("Should be JSON");
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "jetson-stats-exporter");
    assert!(health["timestamp"].is_string());
}

#[tokio::test]
async fn test_index_links_metrics() {
    let app = app_for(StaticSource::not_ready(), &WebConfig::default());
    let (status, _, body) = get(app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#"href="/metrics""#));
}
