//! Telemetry snapshots and the sources that produce them.
//!
//! A snapshot is an untyped tree of sections (`cpu`, `gpu`, `memory`, ...)
//! whose shape varies between Jetson boards and jetson-stats releases. The
//! metrics layer is responsible for making sense of it; this module only
//! models the tree and knows how to fetch it.

pub mod json_source;
pub mod source;
pub mod sysinfo_source;
pub mod value;

// Re-export commonly used items
pub use json_source::JsonFileSource;
pub use source::{wait_until_ready, StaticSource, TelemetrySource};
pub use sysinfo_source::SysinfoSource;
pub use value::{FieldValue, Snapshot};
