//! Node health records and snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Health verdict for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Last probe succeeded
    Healthy,
    /// Last probe failed
    Unhealthy,
    /// Never probed, or the probe did not finish in time
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
            HealthStatus::Unknown => "unknown",
        }
    }

    /// Unknown nodes are optimistically eligible for selection.
    pub fn is_eligible(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of probing one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealthRecord {
    pub status: HealthStatus,
    /// When the verdict was reached (absent for unknown)
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Failure message, present when unhealthy
    pub error: Option<String>,
    /// Probe round-trip, diagnostic only
    pub response_time_ms: Option<u64>,
}

impl HealthRecord {
    pub fn healthy(checked_at: DateTime<Utc>, response_time_ms: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_checked_at: Some(checked_at),
            error: None,
            response_time_ms: Some(response_time_ms),
        }
    }

    pub fn unhealthy(checked_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            last_checked_at: Some(checked_at),
            error: Some(error.into()),
            response_time_ms: None,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Complete per-node health picture produced by one refresh round.
///
/// Keyed by registry index. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HealthSnapshot {
    records: BTreeMap<usize, HealthRecord>,
}

impl HealthSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, record: HealthRecord) {
        self.records.insert(index, record);
    }

    pub fn get(&self, index: usize) -> Option<&HealthRecord> {
        self.records.get(&index)
    }

    /// A node without a record is eligible.
    pub fn is_eligible(&self, index: usize) -> bool {
        self.records
            .get(&index)
            .map_or(true, |record| record.status.is_eligible())
    }

    /// Status of a node, `Unknown` when it has no record
    pub fn status_of(&self, index: usize) -> HealthStatus {
        self.records
            .get(&index)
            .map(|record| record.status)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &HealthRecord)> {
        self.records.iter().map(|(index, record)| (*index, record))
    }
}

impl FromIterator<(usize, HealthRecord)> for HealthSnapshot {
    fn from_iter<I: IntoIterator<Item = (usize, HealthRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
