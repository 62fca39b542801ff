//! Cluster status report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HealthStatus, SelectorMode};

/// Aggregate cluster health, as returned by `status()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatusReport {
    pub mode: SelectorMode,
    pub total_nodes: usize,
    pub healthy_nodes: usize,
    /// Every node not known to be healthy, unknown ones included
    pub unhealthy_nodes: usize,
    pub nodes: Vec<NodeStatusReport>,
}

/// Per-node line of a status report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatusReport {
    pub host: String,
    pub port: u16,
    pub status: HealthStatus,
    pub last_check: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ClusterStatusReport {
    pub fn is_fully_healthy(&self) -> bool {
        self.healthy_nodes == self.total_nodes
    }

    /// At least one node can serve traffic
    pub fn is_operational(&self) -> bool {
        self.healthy_nodes > 0
    }
}
