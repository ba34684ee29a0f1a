//! The telemetry source interface and its in-memory implementation.

use crate::error::{ExporterError, Result};
use crate::telemetry::value::Snapshot;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info};

/// A provider of point-in-time hardware telemetry snapshots.
///
/// Implementations own the connection to whatever reports live hardware
/// state. The collector only ever asks whether the source is ready and,
/// if so, for one fresh snapshot per collection pass.
pub trait TelemetrySource: Send {
    /// Human readable name used in logs.
    fn name(&self) -> &str;

    /// Establish the connection to the underlying service.
    fn connect(&mut self) -> Result<()>;

    /// Whether the source can currently produce snapshots.
    fn is_ready(&self) -> bool;

    /// Read the current state of every section.
    fn snapshot(&mut self) -> Result<Snapshot>;

    /// Release the connection. Safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        (**self).snapshot()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Connect `source` and poll until it reports ready or `timeout` elapses.
pub async fn wait_until_ready<S: TelemetrySource + ?Sized>(
    source: &mut S,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let name = source.name().to_string();
    source.connect().map_err(|e| {
        ExporterError::source_unavailable(format!("{}: connect failed: {}", name, e))
    })?;

    let deadline = Instant::now() + timeout;
    loop {
        if source.is_ready() {
            info!("Telemetry source {} is ready", name);
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ExporterError::source_unavailable(format!(
                "{} did not become ready within {:?}",
                name, timeout
            )));
        }
        debug!("Waiting for telemetry source {}", name);
        time::sleep(poll_interval).await;
    }
}

/// A source serving a fixed snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: Snapshot,
    ready: bool,
}

impl StaticSource {
    /// Create a source that is ready and always returns `snapshot`.
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            ready: true,
        }
    }

    /// Create a source that never becomes ready.
    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }
}

impl TelemetrySource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        if !self.ready {
            return Err(ExporterError::source_error("static source is not ready"));
        }
        Ok(self.snapshot.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.ready = false;
        Ok(())
    }
}
