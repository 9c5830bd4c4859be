//! Probe capability injected into the registry

use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Result of a single reachability check
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeOutcome {
    Success { duration: Duration },
    Failure { reason: String },
}

impl ProbeOutcome {
    pub fn success(duration: Duration) -> Self {
        ProbeOutcome::Success { duration }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        ProbeOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }
}

/// Something that can tell whether a URL is reachable and how fast
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, url: &str, timeout: Duration) -> ProbeOutcome;
}

/// HEAD-request health check
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, url: &str, limit: Duration) -> ProbeOutcome {
        debug!("Probing {} with timeout {:?}", url, limit);

        let start_time = Instant::now();
        let response = match timeout(limit, self.client.head(url).timeout(limit).send()).await {
            Err(_) => return ProbeOutcome::failure("request timeout"),
            Ok(Err(e)) if e.is_timeout() => return ProbeOutcome::failure("request timeout"),
            Ok(Err(e)) => return ProbeOutcome::failure(format!("request failed: {}", e)),
            Ok(Ok(response)) => response,
        };
        let elapsed = start_time.elapsed();

        let status = response.status();
        if status.is_success() || status.is_redirection() {
            ProbeOutcome::success(elapsed)
        } else {
            ProbeOutcome::failure(format!("unexpected status {}", status))
        }
    }
}

/// Stand-in probe with a fixed delay and random outcome, for demos without
/// network access
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    delay: Duration,
    online_ratio: f64,
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1500),
            online_ratio: 0.8,
        }
    }
}

impl SimulatedProbe {
    pub fn new(delay: Duration, online_ratio: f64) -> Self {
        Self {
            delay,
            online_ratio: online_ratio.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl Probe for SimulatedProbe {
    async fn check(&self, _url: &str, limit: Duration) -> ProbeOutcome {
        if self.delay > limit {
            sleep(limit).await;
            return ProbeOutcome::failure("simulated timeout");
        }
        sleep(self.delay).await;

        let mut rng = rand::rng();
        if rng.random_bool(self.online_ratio) {
            ProbeOutcome::success(Duration::from_millis(rng.random_range(50..350)))
        } else {
            ProbeOutcome::failure("simulated outage")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> HttpProbe {
        HttpProbe::new("resource_monitor-test").unwrap()
    }

    #[tokio::test]
    async fn test_http_probe_success() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = probe()
            .check(&format!("{}/health", server.uri()), Duration::from_secs(5))
            .await;

        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_http_probe_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = probe().check(&server.uri(), Duration::from_secs(5)).await;

        match outcome {
            ProbeOutcome::Failure { reason } => assert!(reason.contains("500")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_probe_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let outcome = probe()
            .check(&server.uri(), Duration::from_millis(100))
            .await;

        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_http_probe_unreachable() {
        // Port 9 (discard) is closed on test machines
        let outcome = probe()
            .check("http://127.0.0.1:9", Duration::from_secs(2))
            .await;

        assert!(!outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_probe_always_online() {
        let probe = SimulatedProbe::new(Duration::from_millis(1500), 1.0);

        match probe.check("https://example.com", Duration::from_secs(5)).await {
            ProbeOutcome::Success { duration } => {
                assert!(duration >= Duration::from_millis(50));
                assert!(duration < Duration::from_millis(350));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_probe_always_offline() {
        let probe = SimulatedProbe::new(Duration::from_millis(10), 0.0);
        let outcome = probe.check("https://example.com", Duration::from_secs(5)).await;
        assert_eq!(outcome, ProbeOutcome::failure("simulated outage"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_probe_respects_timeout() {
        let probe = SimulatedProbe::new(Duration::from_secs(10), 1.0);
        let outcome = probe.check("https://example.com", Duration::from_secs(1)).await;
        assert_eq!(outcome, ProbeOutcome::failure("simulated timeout"));
    }
}
