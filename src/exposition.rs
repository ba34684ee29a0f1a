//! The metrics sink: record producers in, Prometheus text format out.
//!
//! Producers are registered explicitly with a [`MetricsSink`]. On every
//! scrape the sink asks each producer for a fresh set of records and encodes
//! them into a registry built for that scrape alone, so nothing leaks from
//! one scrape into the next.

use crate::error::{MetricsError, Result};
use crate::metrics::record::{GaugeRecord, InfoRecord, MetricRecord};
use async_trait::async_trait;
use futures_util::future::join_all;
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tracing::{debug, warn};

/// Something that can produce a set of metric records on demand.
#[async_trait]
pub trait RecordProducer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Produce the records for one scrape. Must not fail; an empty set is valid.
    async fn produce(&self) -> Vec<MetricRecord>;
}

/// Registry of record producers served on each scrape.
#[derive(Default)]
pub struct MetricsSink {
    producers: Vec<Arc<dyn RecordProducer>>,
}

impl MetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, producer: Arc<dyn RecordProducer>) {
        debug!("Registered record producer {}", producer.name());
        self.producers.push(producer);
    }

    pub fn producer_count(&self) -> usize {
        self.producers.len()
    }

    /// Ask every producer for its records. Producers run concurrently; the
    /// result keeps registration order.
    pub async fn gather(&self) -> Vec<MetricRecord> {
        join_all(self.producers.iter().map(|producer| producer.produce()))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Gather and encode one scrape.
    pub async fn render(&self) -> Result<String> {
        let records = self.gather().await;
        Ok(encode(&records)?)
    }

    /// Content type of [`MetricsSink::render`] output.
    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

/// Encode records in the Prometheus text exposition format.
///
/// A record the encoder rejects (bad name, duplicate family) is logged and
/// left out; the rest are still encoded.
pub fn encode(records: &[MetricRecord]) -> std::result::Result<String, MetricsError> {
    let registry = Registry::new();
    for record in records {
        if let Err(err) = register_record(&registry, record) {
            warn!("Skipping metric {}: {}", record.name(), err);
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

type RegisterResult = std::result::Result<(), MetricsError>;

fn register_record(registry: &Registry, record: &MetricRecord) -> RegisterResult {
    match record {
        MetricRecord::Gauge(gauge) if gauge.labels.is_empty() => {
            register_plain_gauge(registry, gauge)
        }
        MetricRecord::Gauge(gauge) => register_labelled_gauge(registry, gauge),
        MetricRecord::Info(info) => register_info(registry, info),
    }
}

fn register_plain_gauge(registry: &Registry, record: &GaugeRecord) -> RegisterResult {
    let Some(sample) = record.samples.first() else {
        return Ok(());
    };
    let gauge = Gauge::with_opts(Opts::new(record.name.as_str(), record.help.as_str()))?;
    gauge.set(sample.value);
    registry.register(Box::new(gauge))?;
    Ok(())
}

fn register_labelled_gauge(registry: &Registry, record: &GaugeRecord) -> RegisterResult {
    if record.is_empty() {
        return Ok(());
    }
    let labels: Vec<&str> = record.labels.iter().map(String::as_str).collect();
    let family = GaugeVec::new(Opts::new(record.name.as_str(), record.help.as_str()), &labels)?;
    for sample in &record.samples {
        let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
        family.get_metric_with_label_values(&values)?.set(sample.value);
    }
    registry.register(Box::new(family))?;
    Ok(())
}

/// Info records follow the `<name>_info` convention: a constant 1 carrying
/// the attributes as labels.
fn register_info(registry: &Registry, record: &InfoRecord) -> RegisterResult {
    let keys: Vec<&str> = record.attributes.keys().map(String::as_str).collect();
    let values: Vec<&str> = record.attributes.values().map(String::as_str).collect();
    let family = GaugeVec::new(
        Opts::new(format!("{}_info", record.name), record.help.as_str()),
        &keys,
    )?;
    family.get_metric_with_label_values(&values)?.set(1.0);
    registry.register(Box::new(family))?;
    Ok(())
}
