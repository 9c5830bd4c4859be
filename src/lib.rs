//! Observable resource monitor
//!
//! This library keeps a registry of monitored endpoints and drives each one
//! through its status life-cycle by running injected asynchronous probes.

pub mod config;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod monitor;
pub mod probe;
pub mod registry;
pub mod resource;

pub use config::{MonitorConfig, ProbeMode, RegistryConfig, TargetSpec};
pub use errors::{MonitorError, Result};
pub use events::RegistryEvent;
pub use metrics::ProbeMetricsSnapshot;
pub use monitor::{ResourceMonitor, StatusReport};
pub use probe::{HttpProbe, Probe, ProbeOutcome, SimulatedProbe};
pub use registry::ResourceRegistry;
pub use resource::{MonitoredResource, ResourceId, ResourceStatus, ResourceUpdate, StatusSummary};
