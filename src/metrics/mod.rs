//! Metric derivation from telemetry snapshots.
//!
//! This module holds the normalization layer of the exporter: the scalar
//! resolver that copes with inconsistently shaped readings, one mapper per
//! telemetry section, and the collection pass tying them together.

pub mod collector;
pub mod record;
pub mod resolve;
pub mod sections;

// Re-export commonly used items
pub use collector::{collect, shared_source, JetsonCollector, SharedSource};
pub use record::{GaugeRecord, InfoRecord, MetricRecord, Sample};
pub use resolve::resolve;
