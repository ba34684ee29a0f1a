//! # Jetson Stats Exporter
//!
//! A Prometheus exporter for NVIDIA Jetson boards. It reads hardware
//! telemetry (CPU/GPU utilization, memory, temperatures, power rails, fans,
//! disk and uptime) from a snapshot provider and republishes it as metrics
//! on a pull-based HTTP endpoint.
//!
//! ## Features
//!
//! - **Shape-tolerant normalization**: readings arriving as numbers, lists or
//!   nested mappings are resolved to a single value
//! - **Per-section fault isolation**: one malformed section never hides the rest
//! - **Stateless scrapes**: every scrape reads a fresh snapshot
//! - **Pluggable sources**: jetson-stats JSON dumps or the host's own counters
//! - **Library + Binary**: use as a crate or standalone exporter
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jetson_stats_exporter::{
//!     start_web_server, JetsonCollector, MetricsSink, SysinfoSource, TelemetrySource, WebConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut source = SysinfoSource::new();
//!     source.connect()?;
//!
//!     let mut sink = MetricsSink::new();
//!     JetsonCollector::register_with(jetson_stats_exporter::shared_source(source), &mut sink);
//!
//!     // Serve /metrics on port 8000
//!     start_web_server(WebConfig::default(), sink).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod exposition;
pub mod metrics;
pub mod telemetry;
pub mod web;

// Re-export public API
pub use error::{ExporterError, MetricsError, Result};
pub use exposition::{MetricsSink, RecordProducer};
pub use metrics::{
    collect, resolve, shared_source, GaugeRecord, InfoRecord, JetsonCollector, MetricRecord,
    Sample, SharedSource,
};
pub use telemetry::{
    wait_until_ready, FieldValue, JsonFileSource, Snapshot, StaticSource, SysinfoSource,
    TelemetrySource,
};
pub use web::{start_web_server, WebConfig};

/// The default exporter port
pub const DEFAULT_PORT: u16 = 8000;

/// The default time to wait for the telemetry source at startup, in seconds
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 10;
