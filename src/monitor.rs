//! Headless monitor daemon wiring configuration, probes and the registry

use crate::config::{MonitorConfig, ProbeMode};
use crate::errors::{MonitorError, Result};
use crate::metrics::ProbeMetricsSnapshot;
use crate::probe::{HttpProbe, Probe, SimulatedProbe};
use crate::registry::ResourceRegistry;
use crate::resource::{MonitoredResource, StatusSummary};

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, instrument, warn};

/// Long-running monitor over a set of configured targets
pub struct ResourceMonitor {
    config: MonitorConfig,
    registry: ResourceRegistry,
}

impl ResourceMonitor {
    /// Create a monitor using the probe selected by `config.probe_mode`
    pub fn new(config: MonitorConfig) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let probe: Arc<dyn Probe> = match config.probe_mode {
            ProbeMode::Http => Arc::new(HttpProbe::new(&config.user_agent)?),
            ProbeMode::Simulated => Arc::new(SimulatedProbe::default()),
        };

        Self::with_probe(config, probe)
    }

    /// Create a monitor around an explicit probe implementation
    pub fn with_probe(config: MonitorConfig, probe: Arc<dyn Probe>) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let registry = ResourceRegistry::new(probe, config.registry_config());
        for target in &config.targets {
            registry.register(target.name.clone(), target.url.clone(), None);
        }

        Ok(Self { config, registry })
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Run until Ctrl-C
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting resource monitor {} with {} targets ({} probes)",
            self.registry.registry_id(),
            self.registry.len(),
            self.config.probe_mode
        );

        if self.registry.is_empty() {
            warn!("No targets configured, set MONITOR_TARGETS or pass --target");
        }

        let refresh = self.start_refresh()?;

        let reporter = self.spawn_reporter();

        tokio::signal::ctrl_c().await.map_err(|e| {
            MonitorError::Other(format!("Failed to wait for shutdown signal: {}", e))
        })?;

        info!("Shutting down resource monitor");
        if let Some(refresh) = refresh {
            refresh.abort();
        }
        reporter.abort();
        self.shutdown().await;
        Ok(())
    }

    /// Start the periodic refresh, or run a single round when it is disabled
    fn start_refresh(&self) -> Result<Option<JoinHandle<()>>> {
        match self.config.refresh_interval {
            Some(period) => self.registry.spawn_refresh(period).map(Some),
            None => {
                let started = self.registry.probe_all();
                debug!("Periodic refresh disabled, ran a single round of {} probes", started);
                Ok(None)
            }
        }
    }

    /// Probe every target once and wait until no resource is still checking
    pub async fn run_once(&self) -> StatusReport {
        let mut events = self.registry.subscribe();
        self.registry.probe_all();

        while self.registry.summary().checking > 0 {
            match events.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }

        self.report().await
    }

    pub async fn report(&self) -> StatusReport {
        StatusReport {
            registry_id: self.registry.registry_id().to_string(),
            summary: self.registry.summary(),
            resources: self.registry.list(),
            metrics: self.registry.metrics().await,
        }
    }

    fn spawn_reporter(&self) -> JoinHandle<()> {
        let registry = self.registry.clone();
        let period = self.config.report_interval;

        tokio::spawn(async move {
            let mut report_interval = interval(period);
            // Skip the immediate tick, nothing has been probed yet
            report_interval.tick().await;

            loop {
                report_interval.tick().await;

                let summary = registry.summary();
                let metrics = registry.metrics().await;
                info!(
                    "Monitor status - {} resources: {} online, {} offline, {} checking, {} unchecked; probes: {:.1}% success rate, {} attempts, avg {}ms",
                    summary.total,
                    summary.online,
                    summary.offline,
                    summary.checking,
                    summary.unchecked,
                    metrics.success_rate,
                    metrics.attempts,
                    metrics.avg_duration_ms
                );
            }
        })
    }

    async fn shutdown(&self) {
        let report = self.report().await;
        match serde_json::to_string(&report) {
            Ok(json) => info!("Final status report: {}", json),
            Err(e) => warn!("Could not serialize final status report: {}", e),
        }
        info!("Resource monitor shutdown complete");
    }
}

/// Point-in-time view of the whole monitor
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub registry_id: String,
    pub summary: StatusSummary,
    pub resources: Vec<MonitoredResource>,
    pub metrics: ProbeMetricsSnapshot,
}
