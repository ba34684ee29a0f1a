//! Snapshots read from a JSON document on disk.
//!
//! The jetson-stats service speaks a Python-only protocol, so the usual
//! deployment runs a small sidecar that dumps its state as JSON to a file
//! (for example on a tmpfs) every second. This source re-reads that file on
//! every collection pass.

use crate::error::{ExporterError, Result};
use crate::telemetry::source::TelemetrySource;
use crate::telemetry::value::Snapshot;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Telemetry source backed by a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    connected: bool,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            connected: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    fn connect(&mut self) -> Result<()> {
        // Parse once up front so a broken file is reported at startup
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            ExporterError::source_error(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        Snapshot::from_json_str(&contents)?;
        self.connected = true;
        debug!("Connected to snapshot file {}", self.path.display());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.connected && self.path.is_file()
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        if !self.connected {
            return Err(ExporterError::source_error("snapshot file source is not connected"));
        }
        let contents = fs::read_to_string(&self.path)?;
        Snapshot::from_json_str(&contents)
    }

    fn close(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }
}
