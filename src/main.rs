//! Resource monitor binary

use clap::Parser;
use resource_monitor::{MonitorConfig, ProbeMode, ResourceMonitor, Result, TargetSpec};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Headless monitor reporting the status of HTTP endpoints
#[derive(Parser, Debug)]
#[command(name = "resource-monitor", version)]
struct Cli {
    /// Resource to monitor as name=url, may be repeated
    #[arg(short, long = "target")]
    targets: Vec<TargetSpec>,

    /// Probe implementation: http or simulated
    #[arg(long, env = "PROBE_MODE")]
    probe_mode: Option<ProbeMode>,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Seconds between refreshes of every resource, 0 disables
    #[arg(long)]
    refresh_interval_seconds: Option<u64>,

    /// Probe everything once, print a JSON report and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    fn apply(self, config: &mut MonitorConfig) {
        if !self.targets.is_empty() {
            config.targets.extend(self.targets);
        }

        if let Some(mode) = self.probe_mode {
            config.probe_mode = mode;
        }

        if let Some(ms) = self.probe_timeout_ms {
            config.probe_timeout = Duration::from_millis(ms);
        }

        if let Some(seconds) = self.refresh_interval_seconds {
            config.refresh_interval = (seconds > 0).then(|| Duration::from_secs(seconds));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    initialize_tracing();

    info!("Starting resource monitor v{}", env!("CARGO_PKG_VERSION"));

    // Parse command line overrides
    let cli = Cli::parse();
    let once = cli.once;

    // Load configuration
    let mut config = MonitorConfig::from_env();
    cli.apply(&mut config);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Monitor configuration - Targets: {}, Probe: {}, Timeout: {:?}, Refresh: {:?}",
        config.targets.len(),
        config.probe_mode,
        config.probe_timeout,
        config.refresh_interval
    );

    // Create monitor and register targets
    let monitor = ResourceMonitor::new(config)?;

    // Single round: print a report and exit
    if once {
        let report = monitor.run_once().await;
        println!("{}", serde_json::to_string_pretty(&report).map_err(|e| {
            resource_monitor::MonitorError::Other(format!("Failed to render report: {}", e))
        })?);
        return Ok(());
    }

    // Run until Ctrl-C
    if let Err(e) = monitor.start().await {
        error!("Monitor failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
