//! Monitored resource data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier handed out by a registry, never reused within it
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        ResourceId(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Unchecked,
    Checking,
    Online,
    Offline,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceStatus::Unchecked => write!(f, "unchecked"),
            ResourceStatus::Checking => write!(f, "checking"),
            ResourceStatus::Online => write!(f, "online"),
            ResourceStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Snapshot of a single monitored endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MonitoredResource {
    pub id: ResourceId,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub status: ResourceStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Present only while `status` is `Online`
    pub last_response_time_ms: Option<u64>,
    pub registered_at: DateTime<Utc>,
}

impl MonitoredResource {
    pub(crate) fn new(
        id: ResourceId,
        name: String,
        url: String,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            url,
            description,
            status: ResourceStatus::Unchecked,
            last_checked_at: None,
            last_response_time_ms: None,
            registered_at: Utc::now(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.status == ResourceStatus::Online
    }

    pub fn is_checking(&self) -> bool {
        self.status == ResourceStatus::Checking
    }

    pub(crate) fn begin_check(&mut self) {
        self.status = ResourceStatus::Checking;
        self.last_response_time_ms = None;
    }

    pub(crate) fn mark_online(&mut self, response_time_ms: u64, at: DateTime<Utc>) {
        self.status = ResourceStatus::Online;
        self.last_response_time_ms = Some(response_time_ms);
        self.last_checked_at = Some(at);
    }

    pub(crate) fn mark_offline(&mut self, at: DateTime<Utc>) {
        self.status = ResourceStatus::Offline;
        self.last_response_time_ms = None;
        self.last_checked_at = Some(at);
    }
}

/// Metadata edit applied by the owner of a resource
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
}

impl ResourceUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err("name cannot be empty".to_string());
        }

        if matches!(&self.url, Some(url) if url.trim().is_empty()) {
            return Err("url cannot be empty".to_string());
        }

        Ok(())
    }

    pub(crate) fn apply(self, resource: &mut MonitoredResource) {
        if let Some(name) = self.name {
            resource.name = name;
        }
        if let Some(url) = self.url {
            resource.url = url;
        }
        if let Some(description) = self.description {
            resource.description = description;
        }
    }
}

/// Resource counts by status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub unchecked: usize,
    pub checking: usize,
    pub online: usize,
    pub offline: usize,
}

impl StatusSummary {
    pub(crate) fn record(&mut self, status: ResourceStatus) {
        self.total += 1;
        match status {
            ResourceStatus::Unchecked => self.unchecked += 1,
            ResourceStatus::Checking => self.checking += 1,
            ResourceStatus::Online => self.online += 1,
            ResourceStatus::Offline => self.offline += 1,
        }
    }
}

impl<'a> FromIterator<&'a MonitoredResource> for StatusSummary {
    fn from_iter<I: IntoIterator<Item = &'a MonitoredResource>>(iter: I) -> Self {
        let mut summary = StatusSummary::default();
        for resource in iter {
            summary.record(resource.status);
        }
        summary
    }
}
