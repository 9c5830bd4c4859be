//! Resource registry driving monitored resources through their probe life-cycle

use crate::config::RegistryConfig;
use crate::errors::{MonitorError, Result};
use crate::events::RegistryEvent;
use crate::metrics::{ProbeMetrics, ProbeMetricsSnapshot};
use crate::probe::{Probe, ProbeOutcome};
use crate::resource::{
    MonitoredResource, ResourceId, ResourceStatus, ResourceUpdate, StatusSummary,
};

use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Owned registry of monitored resources.
///
/// Cloning is cheap and every clone shares the same state. Probes run as
/// spawned tokio tasks, so [`ResourceRegistry::probe`] and friends must be
/// called from within a runtime.
#[derive(Clone)]
pub struct ResourceRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    registry_id: String,
    probe: Arc<dyn Probe>,
    config: RegistryConfig,
    state: Mutex<RegistryState>,
    events: broadcast::Sender<RegistryEvent>,
    metrics: ProbeMetrics,
}

#[derive(Default)]
struct RegistryState {
    next_id: u64,
    next_generation: u64,
    // Ids are handed out in increasing order, so key order is registration order
    entries: BTreeMap<ResourceId, Entry>,
}

struct Entry {
    resource: MonitoredResource,
    /// Generation of the probe allowed to move this resource out of `Checking`
    in_flight: Option<u64>,
}

impl ResourceRegistry {
    pub fn new(probe: Arc<dyn Probe>, config: RegistryConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let registry_id = Uuid::new_v4().to_string();

        info!(
            "Created resource registry {} (probe timeout {:?})",
            registry_id, config.probe_timeout
        );

        Self {
            inner: Arc::new(Inner {
                registry_id,
                probe,
                config,
                state: Mutex::new(RegistryState::default()),
                events,
                metrics: ProbeMetrics::new(),
            }),
        }
    }

    pub fn registry_id(&self) -> &str {
        &self.inner.registry_id
    }

    /// Add a resource with status `Unchecked`
    pub fn register(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        description: Option<String>,
    ) -> ResourceId {
        let resource = {
            let mut state = self.state();
            state.next_id += 1;
            let id = ResourceId::from_raw(state.next_id);

            let resource = MonitoredResource::new(id, name.into(), url.into(), description);
            state.entries.insert(
                id,
                Entry {
                    resource: resource.clone(),
                    in_flight: None,
                },
            );
            resource
        };

        info!(
            "Registered resource {} '{}' at {}",
            resource.id, resource.name, resource.url
        );
        self.emit(RegistryEvent::Registered { id: resource.id });

        resource.id
    }

    /// Register a resource and start its first probe right away
    pub fn register_and_probe(
        &self,
        name: impl Into<String>,
        url: impl Into<String>,
        description: Option<String>,
    ) -> ResourceId {
        let id = self.register(name, url, description);
        if let Err(e) = self.probe(id) {
            // Only reachable if another handle deregistered it in between
            warn!("Initial probe for resource {} not started: {}", id, e);
        }
        id
    }

    /// Remove a resource; a probe still in flight for it will be discarded
    #[instrument(skip(self))]
    pub fn deregister(&self, id: ResourceId) -> Result<MonitoredResource> {
        let entry = self
            .state()
            .entries
            .remove(&id)
            .ok_or(MonitorError::NotFound(id))?;

        if entry.in_flight.is_some() {
            debug!("Resource {} removed with a probe in flight", id);
        }
        info!("Deregistered resource {} '{}'", id, entry.resource.name);
        self.emit(RegistryEvent::Deregistered { id });

        Ok(entry.resource)
    }

    /// Apply a metadata edit; the status is left alone
    pub fn update(&self, id: ResourceId, update: ResourceUpdate) -> Result<MonitoredResource> {
        update.validate().map_err(MonitorError::InvalidInput)?;

        let resource = {
            let mut state = self.state();
            let entry = state
                .entries
                .get_mut(&id)
                .ok_or(MonitorError::NotFound(id))?;
            update.apply(&mut entry.resource);
            entry.resource.clone()
        };

        debug!("Updated metadata for resource {}", id);
        self.emit(RegistryEvent::Updated { id });

        Ok(resource)
    }

    /// Start a probe for `id` unless one is already in flight.
    ///
    /// Returns as soon as the probe task is spawned. Probe failures never
    /// surface here; they only move the resource to `Offline`.
    pub fn probe(&self, id: ResourceId) -> Result<()> {
        self.start_probe(id).map(|_| ())
    }

    /// Probe every resource that is not already being checked, returning how
    /// many probes were started
    pub fn probe_all(&self) -> usize {
        let ids: Vec<ResourceId> = self.state().entries.keys().copied().collect();

        let started = ids
            .into_iter()
            .filter(|id| matches!(self.start_probe(*id), Ok(true)))
            .count();

        debug!("Refresh started {} probes", started);
        started
    }

    pub fn get(&self, id: ResourceId) -> Result<MonitoredResource> {
        self.state()
            .entries
            .get(&id)
            .map(|entry| entry.resource.clone())
            .ok_or(MonitorError::NotFound(id))
    }

    /// Snapshot of every resource in registration order
    pub fn list(&self) -> Vec<MonitoredResource> {
        self.state()
            .entries
            .values()
            .map(|entry| entry.resource.clone())
            .collect()
    }

    pub fn summary(&self) -> StatusSummary {
        self.state()
            .entries
            .values()
            .map(|entry| &entry.resource)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.inner.events.subscribe()
    }

    pub async fn metrics(&self) -> ProbeMetricsSnapshot {
        self.inner.metrics.snapshot().await
    }

    /// Spawn a task calling [`ResourceRegistry::probe_all`] every `period`.
    /// The first refresh happens immediately. A zero period is rejected.
    pub fn spawn_refresh(&self, period: Duration) -> Result<JoinHandle<()>> {
        if period.is_zero() {
            return Err(MonitorError::InvalidInput(
                "refresh period must be greater than 0".to_string(),
            ));
        }

        let registry = self.clone();

        Ok(tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                registry.probe_all();
            }
        }))
    }

    /// Returns `Ok(false)` when coalesced into a probe already in flight
    fn start_probe(&self, id: ResourceId) -> Result<bool> {
        let (url, generation) = {
            let mut guard = self.state();
            let state = &mut *guard;
            let entry = state
                .entries
                .get_mut(&id)
                .ok_or(MonitorError::NotFound(id))?;

            if entry.in_flight.is_some() {
                debug!("Probe for resource {} already in flight, coalescing", id);
                return Ok(false);
            }

            state.next_generation += 1;
            entry.in_flight = Some(state.next_generation);
            entry.resource.begin_check();
            (entry.resource.url.clone(), state.next_generation)
        };

        debug!("Starting probe {} for resource {} at {}", generation, id, url);
        self.emit(RegistryEvent::ProbeStarted { id });

        self.inner.metrics.record_started();

        let registry = self.clone();
        tokio::spawn(async move {
            let limit = registry.inner.config.probe_timeout;
            let probe = Arc::clone(&registry.inner.probe);

            // The check runs in its own task so a panic still ends the probe
            let mut check = tokio::spawn(async move { probe.check(&url, limit).await });
            let outcome = match timeout(limit, &mut check).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) if e.is_panic() => ProbeOutcome::failure("check panicked"),
                Ok(Err(e)) => ProbeOutcome::failure(format!("check aborted: {}", e)),
                Err(_) => {
                    check.abort();
                    ProbeOutcome::failure(format!("no answer within {:?}", limit))
                }
            };

            registry.complete(id, generation, outcome).await;
        });

        Ok(true)
    }

    #[instrument(skip(self, outcome))]
    async fn complete(&self, id: ResourceId, generation: u64, outcome: ProbeOutcome) {
        let applied = {
            let mut state = self.state();
            match state.entries.get_mut(&id) {
                Some(entry) if entry.in_flight == Some(generation) => {
                    entry.in_flight = None;
                    let now = Utc::now();
                    match &outcome {
                        ProbeOutcome::Success { duration } => {
                            entry.resource.mark_online(duration.as_millis() as u64, now)
                        }
                        ProbeOutcome::Failure { .. } => entry.resource.mark_offline(now),
                    }
                    Some((entry.resource.status, entry.resource.last_response_time_ms))
                }
                _ => None,
            }
        };

        let Some((status, response_time_ms)) = applied else {
            debug!("Discarding stale probe result for resource {}", id);
            self.inner.metrics.record_discarded().await;
            self.emit(RegistryEvent::ProbeDiscarded { id });
            return;
        };

        match outcome {
            ProbeOutcome::Success { duration } => {
                self.inner.metrics.record_success(duration).await;
                info!("Resource {} is online ({}ms)", id, duration.as_millis());
            }
            ProbeOutcome::Failure { reason } => {
                self.inner.metrics.record_failure().await;
                warn!("Resource {} is offline: {}", id, reason);
            }
        }

        debug_assert!(status != ResourceStatus::Checking);
        self.emit(RegistryEvent::ProbeCompleted {
            id,
            status,
            response_time_ms,
        });
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        // Critical sections never panic midway, so a poisoned lock still holds
        // consistent state
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: RegistryEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("registry_id", &self.inner.registry_id)
            .field("config", &self.inner.config)
            .field("resources", &self.len())
            .finish()
    }
}
