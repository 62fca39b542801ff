//! Cluster configuration types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ClusterNodesSection;
use crate::error::Error;

/// Node selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    /// Rotate through healthy nodes
    #[default]
    RoundRobin,
    /// Weighted random draw over healthy nodes
    Random,
    /// First healthy node in registry order
    Failover,
}

impl SelectorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorMode::RoundRobin => "round_robin",
            SelectorMode::Random => "random",
            SelectorMode::Failover => "failover",
        }
    }
}

impl fmt::Display for SelectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round_robin" => Ok(SelectorMode::RoundRobin),
            "random" => Ok(SelectorMode::Random),
            "failover" => Ok(SelectorMode::Failover),
            other => Err(Error::configuration(format!(
                "Unsupported cluster mode '{}' (expected round_robin, random or failover)",
                other
            ))),
        }
    }
}

/// Validated configuration of one cluster connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Connection name, also namespaces the health cache key
    pub name: String,
    /// Selection strategy
    pub mode: SelectorMode,
    /// Node arrays and shared connection parameters
    pub nodes: ClusterNodesSection,
    /// Attempt budget per operation
    pub retry_attempts: u32,
    /// Pause between attempts (milliseconds)
    pub retry_delay_ms: u64,
    /// Health snapshot lifetime (seconds)
    pub health_check_interval_secs: u64,
    /// Deadline for one health refresh round (milliseconds, 0 = none)
    pub failover_timeout_ms: u64,
}

impl ClusterConfig {
    /// Attempt budget, never below one attempt
    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.max(1)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Cache entries outlive the staleness window by a factor of two.
    pub fn health_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs.saturating_mul(2))
    }

    pub fn failover_timeout(&self) -> Option<Duration> {
        (self.failover_timeout_ms > 0).then(|| Duration::from_millis(self.failover_timeout_ms))
    }

    /// Cache key holding this cluster's health snapshot
    pub fn health_cache_key(&self) -> String {
        format!("{}:{}", crate::HEALTH_CACHE_KEY, self.name)
    }
}
