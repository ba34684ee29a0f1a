//! Error handling for the Jetson stats exporter.

/// A specialized `Result` type for exporter operations.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// The main error type for exporter operations.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot document could not be parsed
    #[error("Failed to parse snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// The telemetry source never became ready
    #[error("Telemetry source unavailable: {0}")]
    SourceUnavailable(String),

    /// The telemetry source failed while producing a snapshot
    #[error("Telemetry source error: {0}")]
    Source(String),

    /// Web server error
    #[error("Web server error: {0}")]
    WebServer(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric derivation or encoding failed
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

impl ExporterError {
    /// Create a new source-unavailable error
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    /// Create a new telemetry source error
    pub fn source_error(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a new web server error
    pub fn web_server_error(msg: impl Into<String>) -> Self {
        Self::WebServer(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Errors raised while turning one section (or one item of a section) into records.
///
/// These never escape a collection pass: the collector logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// A sample carried a different number of label values than its record declares
    #[error("metric {metric} expects {expected} label values, got {actual}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        actual: usize,
    },

    /// A resolved sample value cannot be exported
    #[error("non-finite value {value} for {item}")]
    NonFinite { item: String, value: f64 },

    /// A section payload has a shape its mapper cannot walk
    #[error("section {section}: {reason}")]
    InvalidSection { section: String, reason: String },

    /// The exposition encoder rejected a record
    #[error("exposition error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl MetricsError {
    /// Create a new invalid-section error
    pub fn invalid_section(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSection {
            section: section.into(),
            reason: reason.into(),
        }
    }
}
