//! The collection pass: one snapshot in, a stream of metric records out.

use crate::exposition::{MetricsSink, RecordProducer};
use crate::metrics::record::MetricRecord;
use crate::metrics::sections::{SectionMapper, SECTIONS};
use crate::telemetry::{Snapshot, TelemetrySource};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A telemetry source shared between the collector and the process lifecycle.
pub type SharedSource = Arc<Mutex<Box<dyn TelemetrySource>>>;

/// Box and share an owned source.
pub fn shared_source(source: impl TelemetrySource + 'static) -> SharedSource {
    let boxed: Box<dyn TelemetrySource> = Box::new(source);
    Arc::new(Mutex::new(boxed))
}

/// Derive every record a snapshot supports.
///
/// Sections are mapped lazily, in the fixed order of [`SECTIONS`], as the
/// iterator is advanced. A section that is missing yields nothing; a section
/// that fails to map is logged and yields nothing.
pub fn collect(snapshot: &Snapshot) -> impl Iterator<Item = MetricRecord> + '_ {
    collect_sections(&SECTIONS, snapshot)
}

fn collect_sections<'a>(
    sections: &'a [SectionMapper],
    snapshot: &'a Snapshot,
) -> impl Iterator<Item = MetricRecord> + 'a {
    sections
        .iter()
        .flat_map(move |section| map_section(section, snapshot))
}

fn map_section(section: &SectionMapper, snapshot: &Snapshot) -> Vec<MetricRecord> {
    let Some(payload) = section.keys.iter().find_map(|key| snapshot.section(key)) else {
        return Vec::new();
    };
    match (section.map)(payload) {
        Ok(records) => records,
        Err(err) => {
            warn!("Could not collect {} info: {}", section.name, err);
            Vec::new()
        }
    }
}

/// Collector turning the current state of a telemetry source into records.
///
/// Holds no state between passes; every pass reads a fresh snapshot.
pub struct JetsonCollector {
    source: SharedSource,
}

impl JetsonCollector {
    pub fn new(source: SharedSource) -> Self {
        Self { source }
    }

    /// Wrap an owned source.
    pub fn from_source(source: impl TelemetrySource + 'static) -> Self {
        Self::new(shared_source(source))
    }

    /// Create a collector for `source` and register it with `sink`.
    pub fn register_with(source: SharedSource, sink: &mut MetricsSink) -> Arc<Self> {
        let collector = Arc::new(Self::new(source));
        sink.register(collector.clone());
        collector
    }

    pub fn source(&self) -> SharedSource {
        self.source.clone()
    }

    /// Run one collection pass against the source.
    ///
    /// A source that is not ready, or that fails to produce a snapshot,
    /// yields an empty pass rather than an error.
    pub async fn collect_pass(&self) -> Vec<MetricRecord> {
        let snapshot = {
            let mut source = self.source.lock().await;
            if !source.is_ready() {
                debug!("Telemetry source {} not ready, skipping pass", source.name());
                return Vec::new();
            }
            match source.snapshot() {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    warn!("Failed to read snapshot from {}: {}", source.name(), err);
                    return Vec::new();
                }
            }
        };
        if snapshot.is_empty() {
            debug!("Telemetry snapshot carried no sections");
        }
        collect(&snapshot).collect()
    }
}

#[async_trait]
impl RecordProducer for JetsonCollector {
    fn name(&self) -> &str {
        "jetson"
    }

    async fn produce(&self) -> Vec<MetricRecord> {
        self.collect_pass().await
    }
}
