//! Snapshots built from the host's own counters via `sysinfo`.
//!
//! This source lets the exporter run on boards where the jetson-stats
//! service is not installed. It produces the same section layout the
//! service reports, so the section mappers treat both identically.

use crate::error::{ExporterError, Result};
use crate::telemetry::source::TelemetrySource;
use crate::telemetry::value::{FieldValue, Snapshot};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use sysinfo::{Components, Disks, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Telemetry source reading CPU, memory, thermal, disk and uptime data from the OS.
pub struct SysinfoSource {
    handles: Option<Handles>,
}

struct Handles {
    system: System,
    components: Components,
    disks: Disks,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self { handles: None }
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Handles {
    fn refresh(&mut self) {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();
        self.components.refresh();
        self.disks.refresh();
    }

    fn cpu_section(&self) -> FieldValue {
        FieldValue::mapping(self.system.cpus().iter().enumerate().map(|(i, cpu)| {
            (
                format!("CPU{}", i + 1),
                FieldValue::mapping([("val", cpu.cpu_usage())]),
            )
        }))
    }

    fn memory_section(&self) -> FieldValue {
        let usage = |used: u64, total: u64| {
            FieldValue::mapping([
                ("used", used as f64 / BYTES_PER_MB),
                ("tot", total as f64 / BYTES_PER_MB),
            ])
        };
        let mut sections = BTreeMap::new();
        sections.insert(
            "RAM".to_string(),
            usage(self.system.used_memory(), self.system.total_memory()),
        );
        if self.system.total_swap() > 0 {
            sections.insert(
                "SWAP".to_string(),
                usage(self.system.used_swap(), self.system.total_swap()),
            );
        }
        FieldValue::Mapping(sections)
    }

    fn temperature_section(&self) -> FieldValue {
        FieldValue::mapping(
            self.components
                .iter()
                .map(|c| (c.label().to_string(), c.temperature())),
        )
    }

    fn disk_section(&self) -> FieldValue {
        let root = self
            .disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| self.disks.iter().next());

        match root {
            Some(disk) => {
                let total = disk.total_space();
                let used = total.saturating_sub(disk.available_space());
                FieldValue::mapping([
                    ("used", used as f64 / BYTES_PER_MB),
                    ("total", total as f64 / BYTES_PER_MB),
                ])
            }
            None => FieldValue::Null,
        }
    }

    fn board_section() -> FieldValue {
        let machine = System::host_name()
            .map(|host| format!("{} ({})", host, std::env::consts::ARCH))
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());
        let mut platform = BTreeMap::new();
        platform.insert("Machine".to_string(), FieldValue::from(machine));
        platform.insert("System".to_string(), FieldValue::from(System::name()));
        platform.insert("Release".to_string(), FieldValue::from(System::kernel_version()));
        FieldValue::mapping([("platform", FieldValue::Mapping(platform))])
    }
}

impl TelemetrySource for SysinfoSource {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn connect(&mut self) -> Result<()> {
        if self.handles.is_some() {
            return Ok(());
        }
        let mut system = System::new_all();
        system.refresh_all();
        self.handles = Some(Handles {
            system,
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
        });
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.handles.is_some()
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        let handles = self
            .handles
            .as_mut()
            .ok_or_else(|| ExporterError::source_error("sysinfo source is not connected"))?;
        handles.refresh();

        let mut stats = BTreeMap::new();
        stats.insert(
            "uptime".to_string(),
            FieldValue::Duration(Duration::from_secs(System::uptime())),
        );

        Ok(Snapshot::new()
            .with_section("board", Handles::board_section())
            .with_section("cpu", handles.cpu_section())
            .with_section("memory", handles.memory_section())
            .with_section("temperature", handles.temperature_section())
            .with_section("disk", handles.disk_section())
            .with_section("stats", FieldValue::Mapping(stats)))
    }

    fn close(&mut self) -> Result<()> {
        self.handles = None;
        Ok(())
    }
}
