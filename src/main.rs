//! Jetson Stats Exporter Binary
//!
//! Serves Jetson hardware telemetry as Prometheus metrics.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jetson_stats_exporter::{
    exposition, shared_source, start_web_server, wait_until_ready, JetsonCollector,
    JsonFileSource, MetricsSink, SharedSource, Snapshot, StaticSource, SysinfoSource,
    TelemetrySource, WebConfig, DEFAULT_PORT, DEFAULT_READY_TIMEOUT_SECS,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "jetson_stats_exporter")]
#[command(about = "Jetson Stats Prometheus Exporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Exports NVIDIA Jetson hardware telemetry as Prometheus metrics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Where telemetry snapshots come from
    #[arg(long, value_enum, default_value_t = SourceKind::Sysinfo)]
    source: SourceKind,

    /// Snapshot file read by the `json` source
    #[arg(long, required_if_eq("source", "json"))]
    snapshot_file: Option<PathBuf>,

    /// Seconds to wait for the telemetry source at startup
    #[arg(long, default_value_t = DEFAULT_READY_TIMEOUT_SECS)]
    ready_timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// The host's own counters
    Sysinfo,
    /// A JSON snapshot written by a jetson-stats sidecar
    Json,
    /// An empty in-memory snapshot
    Static,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve metrics over HTTP (default)
    Serve,

    /// Run a single collection pass, print it and exit
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Prometheus text exposition format
    Text,
    /// JSON records
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(&cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        eprintln!("Make sure jetson-stats is installed and its service is running");
        eprintln!("Try running: sudo systemctl restart jtop.service");
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn build_source(cli: &Cli) -> anyhow::Result<Box<dyn TelemetrySource>> {
    Ok(match cli.source {
        SourceKind::Sysinfo => Box::new(SysinfoSource::new()),
        SourceKind::Json => {
            let path = cli
                .snapshot_file
                .clone()
                .context("--snapshot-file is required for the json source")?;
            Box::new(JsonFileSource::new(path))
        }
        SourceKind::Static => Box::new(StaticSource::new(Snapshot::new())),
    })
}

/// Connect the source and wait until it can produce snapshots.
async fn connect_source(cli: &Cli) -> anyhow::Result<SharedSource> {
    let mut source = build_source(cli)?;
    info!("Connecting to telemetry source {}", source.name());
    wait_until_ready(
        &mut source,
        Duration::from_secs(cli.ready_timeout),
        Duration::from_millis(250),
    )
    .await
    .context("Telemetry source unavailable")?;
    info!("Telemetry source {} connection established", source.name());
    Ok(shared_source(source))
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let source = connect_source(cli).await?;
    let mut sink = MetricsSink::new();
    let collector = JetsonCollector::register_with(source.clone(), &mut sink);

    let result = match &cli.command {
        Some(Commands::Snapshot(args)) => snapshot_command(&collector, args).await,
        Some(Commands::Serve) | None => serve_command(cli, &collector, sink).await,
    };

    info!("Closing telemetry source connection...");
    if let Err(e) = source.lock().await.close() {
        warn!("Failed to close telemetry source: {}", e);
    }

    result
}

async fn serve_command(
    cli: &Cli,
    collector: &JetsonCollector,
    sink: MetricsSink,
) -> anyhow::Result<()> {
    info!("Starting Jetson stats exporter on port {}...", cli.port);

    // One pass up front so a broken source shows up before the first scrape
    let records = collector.collect_pass().await;
    info!("Collected {} metric families in test pass", records.len());
    if records.is_empty() {
        warn!("Test pass produced no metrics; scrapes will be empty until the source reports data");
    }

    let config = WebConfig::new(&cli.host, cli.port);
    info!("Web server configuration:");
    info!("  - Bind address: {}", config.bind_address());
    info!("  - Metrics path: {}", config.metrics_path);

    start_web_server(config, sink)
        .await
        .context("Web server failed")?;

    Ok(())
}

async fn snapshot_command(collector: &JetsonCollector, args: &SnapshotArgs) -> anyhow::Result<()> {
    let records = collector.collect_pass().await;

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&records)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            print!("{}", exposition::encode(&records)?);
        }
    }

    Ok(())
}
