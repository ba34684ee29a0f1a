//! Typed metric records produced by a collection pass.

use crate::error::MetricsError;
use serde::Serialize;
use std::collections::BTreeMap;

/// One metric family ready for exposition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricRecord {
    Info(InfoRecord),
    Gauge(GaugeRecord),
}

impl MetricRecord {
    pub fn name(&self) -> &str {
        match self {
            Self::Info(info) => &info.name,
            Self::Gauge(gauge) => &gauge.name,
        }
    }

    pub fn help(&self) -> &str {
        match self {
            Self::Info(info) => &info.help,
            Self::Gauge(gauge) => &gauge.help,
        }
    }

    pub fn as_gauge(&self) -> Option<&GaugeRecord> {
        match self {
            Self::Gauge(gauge) => Some(gauge),
            Self::Info(_) => None,
        }
    }

    pub fn as_info(&self) -> Option<&InfoRecord> {
        match self {
            Self::Info(info) => Some(info),
            Self::Gauge(_) => None,
        }
    }
}

/// Descriptive string attributes with no numeric value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoRecord {
    pub name: String,
    pub help: String,
    pub attributes: BTreeMap<String, String>,
}

impl InfoRecord {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// A gauge family with a fixed label schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeRecord {
    pub name: String,
    pub help: String,
    pub labels: Vec<String>,
    pub samples: Vec<Sample>,
}

/// One labelled value of a gauge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub label_values: Vec<String>,
    pub value: f64,
}

impl GaugeRecord {
    /// Create an empty gauge labelled by `labels`.
    pub fn new(name: impl Into<String>, help: impl Into<String>, labels: &[&str]) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            samples: Vec::new(),
        }
    }

    /// Create an unlabelled gauge holding a single value.
    pub fn single(name: impl Into<String>, help: impl Into<String>, value: f64) -> Self {
        let mut gauge = Self::new(name, help, &[]);
        gauge.samples.push(Sample {
            label_values: Vec::new(),
            value,
        });
        gauge
    }

    /// Append a sample, enforcing the declared label schema.
    pub fn push<S: Into<String>>(
        &mut self,
        label_values: impl IntoIterator<Item = S>,
        value: f64,
    ) -> Result<(), MetricsError> {
        let label_values: Vec<String> = label_values.into_iter().map(Into::into).collect();
        if label_values.len() != self.labels.len() {
            return Err(MetricsError::LabelMismatch {
                metric: self.name.clone(),
                expected: self.labels.len(),
                actual: label_values.len(),
            });
        }
        self.samples.push(Sample {
            label_values,
            value,
        });
        Ok(())
    }

    /// Value of the sample whose label values equal `label_values`.
    pub fn value_for(&self, label_values: &[&str]) -> Option<f64> {
        self.samples
            .iter()
            .find(|s| s.label_values.iter().map(String::as_str).eq(label_values.iter().copied()))
            .map(|s| s.value)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<GaugeRecord> for MetricRecord {
    fn from(gauge: GaugeRecord) -> Self {
        Self::Gauge(gauge)
    }
}

impl From<InfoRecord> for MetricRecord {
    fn from(info: InfoRecord) -> Self {
        Self::Info(info)
    }
}
