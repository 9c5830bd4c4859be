//! Aggregate statistics over accepted probe completions

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Counters {
    successes: u64,
    failures: u64,
    discarded: u64,
    total_duration: Duration,
    min_duration: Option<Duration>,
    max_duration: Option<Duration>,
}

/// Probe metrics tracking, shared by every clone of a registry
#[derive(Debug, Default)]
pub struct ProbeMetrics {
    // Counted synchronously when a probe is started
    attempts: AtomicU64,
    counters: RwLock<Counters>,
}

impl ProbeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub async fn record_success(&self, duration: Duration) {
        let mut counters = self.counters.write().await;
        counters.successes += 1;
        counters.total_duration += duration;
        counters.min_duration = Some(counters.min_duration.map_or(duration, |m| m.min(duration)));
        counters.max_duration = Some(counters.max_duration.map_or(duration, |m| m.max(duration)));
    }

    pub async fn record_failure(&self) {
        self.counters.write().await.failures += 1;
    }

    pub async fn record_discarded(&self) {
        self.counters.write().await.discarded += 1;
    }

    pub async fn snapshot(&self) -> ProbeMetricsSnapshot {
        let counters = self.counters.read().await;

        let completed = counters.successes + counters.failures;
        let success_rate = if completed > 0 {
            (counters.successes as f64 / completed as f64) * 100.0
        } else {
            0.0
        };

        // Only successful probes carry a latency
        let avg_duration_ms = if counters.successes > 0 {
            counters.total_duration.as_nanos() / counters.successes as u128 / 1_000_000
        } else {
            0
        };

        ProbeMetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            successes: counters.successes,
            failures: counters.failures,
            discarded: counters.discarded,
            success_rate,
            avg_duration_ms: avg_duration_ms as u64,
            min_duration_ms: counters.min_duration.map(|d| d.as_millis() as u64),
            max_duration_ms: counters.max_duration.map(|d| d.as_millis() as u64),
        }
    }
}

/// Snapshot of probe metrics
#[derive(Debug, Clone, Serialize)]
pub struct ProbeMetricsSnapshot {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub discarded: u64,
    pub success_rate: f64,
    pub avg_duration_ms: u64,
    pub min_duration_ms: Option<u64>,
    pub max_duration_ms: Option<u64>,
}
