//! Change notifications published by the registry

use crate::resource::{ResourceId, ResourceStatus};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    Registered {
        id: ResourceId,
    },
    Updated {
        id: ResourceId,
    },
    Deregistered {
        id: ResourceId,
    },
    ProbeStarted {
        id: ResourceId,
    },
    ProbeCompleted {
        id: ResourceId,
        status: ResourceStatus,
        response_time_ms: Option<u64>,
    },
    /// A completion arrived for a resource that is gone or no longer expects it
    ProbeDiscarded {
        id: ResourceId,
    },
}

impl RegistryEvent {
    pub fn resource_id(&self) -> ResourceId {
        match self {
            RegistryEvent::Registered { id }
            | RegistryEvent::Updated { id }
            | RegistryEvent::Deregistered { id }
            | RegistryEvent::ProbeStarted { id }
            | RegistryEvent::ProbeCompleted { id, .. }
            | RegistryEvent::ProbeDiscarded { id } => *id,
        }
    }

    /// True for events that end a probe, whether applied or not
    pub fn is_probe_end(&self) -> bool {
        matches!(
            self,
            RegistryEvent::ProbeCompleted { .. } | RegistryEvent::ProbeDiscarded { .. }
        )
    }
}
