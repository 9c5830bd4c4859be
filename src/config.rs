//! Configuration management for the resource monitor

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which probe implementation the monitor runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    Http,
    Simulated,
}

impl FromStr for ProbeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(ProbeMode::Http),
            "simulated" | "sim" => Ok(ProbeMode::Simulated),
            other => Err(format!("unknown probe mode '{}'", other)),
        }
    }
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::Http => write!(f, "http"),
            ProbeMode::Simulated => write!(f, "simulated"),
        }
    }
}

/// A resource to register at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    pub url: String,
}

impl FromStr for TargetSpec {
    type Err = String;

    /// Parses `name=url`, or a bare `url` used as its own name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, url) = match s.split_once('=') {
            Some((name, url)) => (name.trim(), url.trim()),
            None => (s, s),
        };

        if name.is_empty() || url.is_empty() {
            return Err(format!("invalid target '{}', expected name=url", s));
        }

        Ok(TargetSpec {
            name: name.to_string(),
            url: url.to_string(),
        })
    }
}

/// Settings the registry itself needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Upper bound for a single probe
    pub probe_timeout: Duration,

    /// Buffered events per subscriber before old ones are dropped
    pub event_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(5000),
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Resources registered when the monitor starts
    pub targets: Vec<TargetSpec>,

    /// Upper bound for a single probe
    pub probe_timeout: Duration,

    /// Interval between automatic refreshes of every resource, `None` disables
    pub refresh_interval: Option<Duration>,

    /// Interval between status reports
    pub report_interval: Duration,

    /// Probe implementation
    pub probe_mode: ProbeMode,

    /// Broadcast channel capacity for registry events
    pub event_capacity: usize,

    /// User agent sent by the HTTP probe
    pub user_agent: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            probe_timeout: Duration::from_millis(5000),
            refresh_interval: Some(Duration::from_secs(30)),
            report_interval: Duration::from_secs(60),
            probe_mode: ProbeMode::Http,
            event_capacity: 256,
            user_agent: format!("resource_monitor/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = MonitorConfig::default();

        if let Ok(targets) = env::var("MONITOR_TARGETS") {
            config.targets = parse_targets(&targets);
        }

        if let Ok(timeout) = env::var("PROBE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                config.probe_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(refresh) = env::var("REFRESH_INTERVAL_SECONDS") {
            if let Ok(seconds) = refresh.parse::<u64>() {
                config.refresh_interval = (seconds > 0).then(|| Duration::from_secs(seconds));
            }
        }

        if let Ok(report) = env::var("REPORT_INTERVAL_SECONDS") {
            if let Ok(seconds) = report.parse::<u64>() {
                config.report_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(mode) = env::var("PROBE_MODE") {
            if let Ok(mode) = mode.parse() {
                config.probe_mode = mode;
            }
        }

        if let Ok(capacity) = env::var("EVENT_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.event_capacity = capacity;
            }
        }

        if let Ok(user_agent) = env::var("USER_AGENT") {
            config.user_agent = user_agent;
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.probe_timeout.is_zero() {
            return Err("probe_timeout must be greater than 0".to_string());
        }

        if self.refresh_interval.is_some_and(|period| period.is_zero()) {
            return Err("refresh_interval must be greater than 0, leave it unset to disable".to_string());
        }

        if self.report_interval.is_zero() {
            return Err("report_interval must be greater than 0".to_string());
        }

        if self.event_capacity == 0 {
            return Err("event_capacity must be greater than 0".to_string());
        }

        if self.user_agent.is_empty() {
            return Err("user_agent cannot be empty".to_string());
        }

        if let Some(target) = self.targets.iter().find(|t| t.url.is_empty()) {
            return Err(format!("target '{}' has an empty url", target.name));
        }

        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            probe_timeout: self.probe_timeout,
            event_capacity: self.event_capacity,
        }
    }
}

/// Parse a comma-separated target list, skipping malformed entries
pub fn parse_targets(raw: &str) -> Vec<TargetSpec> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.probe_mode, ProbeMode::Http);
        assert_eq!(config.registry_config(), RegistryConfig::default());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = MonitorConfig::default();
        config.probe_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.event_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.refresh_interval = Some(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_targets() {
        let targets = parse_targets(
            "Main Web Server=https://example.com, api=https://api.example.com/health?full=1,,https://cdn.example.com",
        );

        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].name, "Main Web Server");
        assert_eq!(targets[0].url, "https://example.com");
        assert_eq!(targets[1].url, "https://api.example.com/health?full=1");
        assert_eq!(targets[2].name, "https://cdn.example.com");
    }

    #[test]
    fn test_invalid_target_skipped() {
        assert!("=https://example.com".parse::<TargetSpec>().is_err());
        assert!("name=".parse::<TargetSpec>().is_err());
        assert!(parse_targets("=x, ok=https://ok.example.com").len() == 1);
    }

    #[test]
    fn test_probe_mode_parsing() {
        assert_eq!("HTTP".parse::<ProbeMode>(), Ok(ProbeMode::Http));
        assert_eq!("simulated".parse::<ProbeMode>(), Ok(ProbeMode::Simulated));
        assert!("icmp".parse::<ProbeMode>().is_err());
    }
}
