//! Per-section mapping from telemetry payloads to metric records.
//!
//! Every mapper is independent: it receives one section payload and either
//! returns the records for that section or an error describing why the
//! payload could not be walked. Failures inside a section are limited to the
//! item that caused them wherever the section has more than one item.

use crate::error::MetricsError;
use crate::metrics::record::{GaugeRecord, InfoRecord, MetricRecord};
use crate::metrics::resolve::{resolve, resolve_first_key, resolve_key};
use crate::telemetry::FieldValue;
use std::collections::BTreeMap;
use tracing::warn;

pub const BOARD_INFO: &str = "jetson_info";
pub const CPU_USAGE: &str = "jetson_usage_cpu";
pub const GPU_USAGE: &str = "jetson_usage_gpu";
pub const GPU_FREQUENCY: &str = "jetson_freq_gpu";
pub const RAM_USAGE: &str = "jetson_usage_ram";
pub const SWAP_USAGE: &str = "jetson_usage_swap";
pub const TEMPERATURES: &str = "jetson_temperatures";
pub const POWER: &str = "jetson_power";
pub const FAN_SPEED: &str = "jetson_fan_speed";
pub const DISK_USAGE: &str = "jetson_disk_usage";
pub const UPTIME: &str = "jetson_uptime_seconds";

/// Attribute value used when a board field is missing.
pub const UNKNOWN: &str = "unknown";

/// Outcome of mapping one section.
pub type SectionResult = Result<Vec<MetricRecord>, MetricsError>;

/// A telemetry section and the function that maps it.
#[derive(Clone, Copy)]
pub struct SectionMapper {
    /// Name used in logs.
    pub name: &'static str,
    /// Snapshot keys holding this section, first present wins.
    pub keys: &'static [&'static str],
    pub map: fn(&FieldValue) -> SectionResult,
}

impl std::fmt::Debug for SectionMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionMapper")
            .field("name", &self.name)
            .field("keys", &self.keys)
            .finish()
    }
}

/// Every known section in emission order.
pub static SECTIONS: [SectionMapper; 9] = [
    SectionMapper {
        name: "board",
        keys: &["board", "info"],
        map: map_board,
    },
    SectionMapper {
        name: "cpu",
        keys: &["cpu"],
        map: map_cpu,
    },
    SectionMapper {
        name: "gpu",
        keys: &["gpu"],
        map: map_gpu,
    },
    SectionMapper {
        name: "memory",
        keys: &["memory"],
        map: map_memory,
    },
    SectionMapper {
        name: "temperature",
        keys: &["temperature"],
        map: map_temperature,
    },
    SectionMapper {
        name: "power",
        keys: &["power"],
        map: map_power,
    },
    SectionMapper {
        name: "fan",
        keys: &["fan"],
        map: map_fan,
    },
    SectionMapper {
        name: "disk",
        keys: &["disk"],
        map: map_disk,
    },
    SectionMapper {
        name: "stats",
        keys: &["stats"],
        map: map_stats,
    },
];

fn expect_mapping<'a>(
    section: &str,
    payload: &'a FieldValue,
) -> Result<&'a BTreeMap<String, FieldValue>, MetricsError> {
    payload
        .as_mapping()
        .ok_or_else(|| MetricsError::invalid_section(section, "expected a mapping of entries"))
}

/// Optional sub-mapping `key`: absent is fine, present but not a mapping is not.
fn sub_mapping<'a>(
    section: &str,
    payload: &'a FieldValue,
    key: &str,
) -> Result<Option<&'a FieldValue>, MetricsError> {
    match payload.get(key) {
        None => Ok(None),
        Some(inner) if inner.as_mapping().is_some() => Ok(Some(inner)),
        Some(_) => Err(MetricsError::invalid_section(
            section,
            format!("`{}` is not a mapping", key),
        )),
    }
}

fn attribute(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), FieldValue::to_attribute)
}

/// Resolve one item of a multi-item section and add it to `gauge`.
fn push_item(
    gauge: &mut GaugeRecord,
    item: &str,
    reading: &FieldValue,
) -> Result<f64, MetricsError> {
    let value = resolve(reading);
    if !value.is_finite() {
        return Err(MetricsError::NonFinite {
            item: item.to_string(),
            value,
        });
    }
    gauge.push([item.to_lowercase()], value)?;
    Ok(value)
}

/// Board identity. Two layouts are known: an `info` sub-mapping, or a
/// `platform` sub-mapping with the release fields at the top level.
pub fn map_board(payload: &FieldValue) -> SectionResult {
    expect_mapping("board", payload)?;
    let mut info = InfoRecord::new(BOARD_INFO, "Jetson board information");
    let attrs = &mut info.attributes;

    if let Some(details) = sub_mapping("board", payload, "info")? {
        attrs.insert("machine".into(), attribute(details.get("machine")));
        attrs.insert("jetpack".into(), attribute(details.get("jetpack")));
        attrs.insert("l4t".into(), attribute(details.get("L4T")));
    } else if let Some(platform) = sub_mapping("board", payload, "platform")? {
        attrs.insert("machine".into(), attribute(platform.get("Machine")));
        attrs.insert("jetpack".into(), attribute(payload.get("Jetpack")));
        attrs.insert("l4t".into(), attribute(payload.get("L4T")));
    }

    if let Some(hardware) = sub_mapping("board", payload, "hardware")? {
        attrs.insert("type".into(), attribute(hardware.get("TYPE")));
        attrs.insert("codename".into(), attribute(hardware.get("CODENAME")));
        attrs.insert("soc".into(), attribute(hardware.get("SOC")));
    }

    if info.attributes.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![info.into()])
}

pub fn map_cpu(payload: &FieldValue) -> SectionResult {
    let cores = expect_mapping("cpu", payload)?;
    let mut gauge = GaugeRecord::new(CPU_USAGE, "CPU % usage", &["cpu"]);
    for (core, reading) in cores {
        // a core that cannot be resolved is left out of this pass
        let _ = push_item(&mut gauge, core, reading);
    }
    Ok(vec![gauge.into()])
}

pub fn map_gpu(payload: &FieldValue) -> SectionResult {
    let mut records: Vec<MetricRecord> =
        vec![GaugeRecord::single(GPU_USAGE, "GPU % usage", resolve(payload)).into()];

    if let Some(frq) = payload.get("frq") {
        let frequency = resolve(frq);
        if frequency > 0.0 {
            records.push(GaugeRecord::single(GPU_FREQUENCY, "GPU frequency MHz", frequency).into());
        }
    }
    Ok(records)
}

fn usage_record(
    name: &str,
    help: &str,
    usage: &FieldValue,
    total_keys: &[&str],
) -> Result<GaugeRecord, MetricsError> {
    let mut gauge = GaugeRecord::new(name, help, &["type"]);
    gauge.push(["used"], resolve_key(usage, "used"))?;
    gauge.push(["total"], resolve_first_key(usage, total_keys))?;
    Ok(gauge)
}

pub fn map_memory(payload: &FieldValue) -> SectionResult {
    let memory = expect_mapping("memory", payload)?;
    let mut records: Vec<MetricRecord> = Vec::new();
    for (key, name, help) in [
        ("RAM", RAM_USAGE, "RAM usage MB"),
        ("SWAP", SWAP_USAGE, "SWAP usage MB"),
    ] {
        if let Some(usage) = memory.get(key).filter(|u| u.as_mapping().is_some()) {
            records.push(usage_record(name, help, usage, &["tot", "total"])?.into());
        }
    }
    Ok(records)
}

pub fn map_temperature(payload: &FieldValue) -> SectionResult {
    let sensors = expect_mapping("temperature", payload)?;
    let mut gauge = GaugeRecord::new(TEMPERATURES, "Temperature sensors Celsius", &["sensor"]);
    for (sensor, reading) in sensors {
        let _ = push_item(&mut gauge, sensor, reading);
    }
    Ok(vec![gauge.into()])
}

/// Power rails. Rails reading zero or less are idle or unpopulated and are
/// left out; a bare scalar payload is reported as the `total` rail.
pub fn map_power(payload: &FieldValue) -> SectionResult {
    let mut gauge = GaugeRecord::new(POWER, "Power consumption mW", &["rail"]);
    match payload {
        FieldValue::Mapping(rails) => {
            for (rail, reading) in rails {
                let value = resolve(reading);
                if value > 0.0 {
                    let _ = push_item(&mut gauge, rail, reading);
                }
            }
        }
        scalar => gauge.push(["total"], resolve(scalar))?,
    }
    Ok(vec![gauge.into()])
}

pub fn map_fan(payload: &FieldValue) -> SectionResult {
    let fans = expect_mapping("fan", payload)?;
    let mut gauge = GaugeRecord::new(FAN_SPEED, "Fan speed %", &["fan"]);
    for (fan, reading) in fans {
        if let Err(err) = push_item(&mut gauge, fan, reading) {
            warn!("Could not process fan '{}': {}", fan, err);
        }
    }
    Ok(vec![gauge.into()])
}

pub fn map_disk(payload: &FieldValue) -> SectionResult {
    match payload {
        FieldValue::Mapping(_) => Ok(vec![usage_record(
            DISK_USAGE,
            "Disk usage MB",
            payload,
            &["total", "tot"],
        )?
        .into()]),
        _ => Ok(Vec::new()),
    }
}

pub fn map_stats(payload: &FieldValue) -> SectionResult {
    let stats = expect_mapping("stats", payload)?;
    let Some(uptime) = stats.get("uptime") else {
        return Ok(Vec::new());
    };
    let seconds = uptime
        .as_duration()
        .map_or_else(|| resolve(uptime), |d| d.as_secs_f64());
    Ok(vec![
        GaugeRecord::single(UPTIME, "System uptime in seconds", seconds).into(),
    ])
}
