use jetson_stats_exporter::{
    collect,
    error::{ExporterError, MetricsError},
    exposition,
    metrics::sections::{CPU_USAGE, GPU_FREQUENCY, GPU_USAGE, POWER, RAM_USAGE, UPTIME},
    resolve, FieldValue, JetsonCollector, MetricRecord, Snapshot, StaticSource, TelemetrySource,
    WebConfig,
};
use serde_json::json;

fn snapshot(value: serde_json::Value) -> Snapshot {
    Snapshot::from_json_str(&value.to_string()).expect("Should parse snapshot")
}

fn find<'a>(records: &'a [MetricRecord], name: &str) -> Option<&'a MetricRecord> {
    records.iter().find(|r| r.name() == name)
}

/// Test scalar resolution across reading shapes
#[test]
fn test_resolve_reading_shapes() {
    assert_eq!(resolve(&FieldValue::from(42)), 42.0);
    assert_eq!(resolve(&FieldValue::from(true)), 0.0);
    assert_eq!(resolve(&FieldValue::from(vec![7.5, 1.0])), 7.5);
    assert_eq!(resolve(&FieldValue::from(Vec::<f64>::new())), 0.0);
    assert_eq!(resolve(&FieldValue::from("hot")), 0.0);
    assert_eq!(resolve(&FieldValue::Null), 0.0);

    let nested: FieldValue = json!({"cur": {"val": 3}}).into();
    assert_eq!(resolve(&nested), 3.0);

    let unkeyed: FieldValue = json!({"min": 1, "max": 9}).into();
    assert_eq!(resolve(&unkeyed), 0.0);

    let ordered: FieldValue = json!({"avg": 5, "value": 2}).into();
    assert_eq!(resolve(&ordered), 2.0);
}

#[test]
fn test_ram_reported_as_used_and_total() {
    let snap = snapshot(json!({"memory": {"RAM": {"used": 2048, "tot": 8192}}}));
    let records: Vec<MetricRecord> = collect(&snap).collect();

    let ram = find(&records, RAM_USAGE)
        .and_then(MetricRecord::as_gauge)
        .expect("Should emit RAM usage");
    assert_eq!(ram.value_for(&["used"]), Some(2048.0));
    assert_eq!(ram.value_for(&["total"]), Some(8192.0));
    assert_eq!(ram.samples.len(), 2);
}

#[test]
fn test_idle_power_rails_are_excluded() {
    let snap = snapshot(json!({"power": {"VDD_IN": 0, "VDD_CPU": 1500}}));
    let records: Vec<MetricRecord> = collect(&snap).collect();

    let power = find(&records, POWER)
        .and_then(MetricRecord::as_gauge)
        .expect("Should emit power");
    assert_eq!(power.samples.len(), 1);
    assert_eq!(power.value_for(&["vdd_cpu"]), Some(1500.0));
    assert_eq!(power.value_for(&["vdd_in"]), None);
}

#[test]
fn test_scalar_power_is_total_rail() {
    let snap = snapshot(json!({"power": 4200}));
    let records: Vec<MetricRecord> = collect(&snap).collect();
    let power = records[0].as_gauge().expect("Should be a gauge");
    assert_eq!(power.value_for(&["total"]), Some(4200.0));
}

#[test]
fn test_missing_gpu_emits_no_gpu_records() {
    let snap = snapshot(json!({"cpu": {"CPU1": {"val": 12}}}));
    let records: Vec<MetricRecord> = collect(&snap).collect();

    assert!(find(&records, CPU_USAGE).is_some());
    assert!(find(&records, GPU_USAGE).is_none());
    assert!(find(&records, GPU_FREQUENCY).is_none());
}

#[test]
fn test_empty_section_counts_as_missing() {
    let snap = snapshot(json!({"gpu": {}, "stats": {"uptime": 30}}));
    let records: Vec<MetricRecord> = collect(&snap).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), UPTIME);
}

#[test]
fn test_unresolvable_core_does_not_hide_others() {
    let snap = snapshot(json!({
        "cpu": {"CPU1": {"val": 10}, "CPU2": "offline", "CPU3": {"val": 30}},
        "gpu": {"val": 55}
    }));
    let records: Vec<MetricRecord> = collect(&snap).collect();

    let cpu = find(&records, CPU_USAGE)
        .and_then(MetricRecord::as_gauge)
        .expect("Should emit CPU usage");
    assert_eq!(cpu.value_for(&["cpu1"]), Some(10.0));
    assert_eq!(cpu.value_for(&["cpu3"]), Some(30.0));
    assert!(find(&records, GPU_USAGE).is_some());
}

#[test]
fn test_malformed_section_is_isolated() {
    let snap = snapshot(json!({
        "memory": [1, 2, 3],
        "disk": {"used": 10, "total": 100}
    }));
    let records: Vec<MetricRecord> = collect(&snap).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name(), "jetson_disk_usage");
}

#[test]
fn test_timedelta_uptime() {
    let snap = snapshot(json!({"stats": {"uptime": "1 day, 2:00:30"}}));
    let records: Vec<MetricRecord> = collect(&snap).collect();
    let uptime = records[0].as_gauge().expect("Should be a gauge");
    assert_eq!(uptime.samples[0].value, 93_630.0);
}

#[test]
fn test_not_ready_source_yields_empty_pass() {
    let collector = JetsonCollector::from_source(StaticSource::not_ready());
    let records = tokio_test::block_on(collector.collect_pass());
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_repeated_passes_are_identical() {
    let snap = snapshot(json!({
        "cpu": {"CPU1": {"val": 10}},
        "memory": {"RAM": {"used": 1, "tot": 2}},
        "power": {"VDD_CPU": 900}
    }));
    let collector = JetsonCollector::from_source(StaticSource::new(snap));

    let first = collector.collect_pass().await;
    let second = collector.collect_pass().await;
    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[tokio::test]
async fn test_closed_source_yields_empty_pass() {
    let collector = JetsonCollector::from_source(StaticSource::new(snapshot(
        json!({"gpu": {"val": 1}}),
    )));
    assert_eq!(collector.collect_pass().await.len(), 1);

    collector
        .source()
        .lock()
        .await
        .close()
        .expect("Should close source");
    assert!(collector.collect_pass().await.is_empty());
}

#[test]
fn test_encoded_output() {
    let snap = snapshot(json!({
        "board": {"platform": {"Machine": "aarch64"}, "Jetpack": "5.1", "L4T": "35.3.1"},
        "gpu": {"val": 40, "frq": 0}
    }));
    let records: Vec<MetricRecord> = collect(&snap).collect();
    let text = exposition::encode(&records).expect("Should encode");

    assert!(text.contains(r#"jetson_info_info{jetpack="5.1",l4t="35.3.1",machine="aarch64"} 1"#));
    assert!(text.contains("jetson_usage_gpu 40"));
    assert!(!text.contains("jetson_freq_gpu"));
}

#[test]
fn test_web_config() {
    let config = WebConfig::default();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8000);
    assert_eq!(config.metrics_path, "/metrics");

    let custom = WebConfig::new("127.0.0.1", 9100).with_metrics_path("/scrape");
    assert_eq!(custom.bind_address(), "127.0.0.1:9100");
    assert_eq!(custom.metrics_path, "/scrape");
    assert_eq!(WebConfig::default().with_port(1).with_host("::1").port, 1);
}

#[test]
fn test_error_display() {
    let unavailable = ExporterError::source_unavailable("jtop not running");
    assert_eq!(
        unavailable.to_string(),
        "Telemetry source unavailable: jtop not running"
    );

    let section: ExporterError = MetricsError::invalid_section("cpu", "expected a mapping").into();
    assert!(section.to_string().contains("cpu"));
}
