//! Health tracking for cluster nodes
//!
//! The tracker keeps one [`HealthSnapshot`] per cluster in the shared cache,
//! next to the time it was computed. A snapshot older than the health check
//! interval is stale; the next caller that needs node health probes every
//! node again and replaces the snapshot wholesale.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use colonnade_core::types::{
    ClusterConfig, HealthRecord, HealthSnapshot, NodeDescriptor, QueryParams, RowSet,
};

use crate::cache::SharedCache;
use crate::clock::Clock;
use crate::connection::Connector;
use crate::error::ConnectionError;
use crate::metrics;
use crate::registry::NodeRegistry;

/// Statement every probe runs
pub const PROBE_SQL: &str = "SELECT 1 AS health_check";

/// Maintains the cluster health snapshot
pub struct HealthTracker {
    cluster: String,
    snapshot_key: String,
    timestamp_key: String,
    interval: Duration,
    cache_ttl: Duration,
    refresh_deadline: Option<Duration>,
    registry: Arc<NodeRegistry>,
    cache: Arc<dyn SharedCache>,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    // Single-flight guard for refreshes started by this process
    refresh_lock: Mutex<()>,
}

impl HealthTracker {
    pub fn new(
        config: &ClusterConfig,
        registry: Arc<NodeRegistry>,
        cache: Arc<dyn SharedCache>,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let snapshot_key = config.health_cache_key();
        let timestamp_key = format!("{}_last_check", snapshot_key);

        Self {
            cluster: config.name.clone(),
            snapshot_key,
            timestamp_key,
            interval: config.health_check_interval(),
            cache_ttl: config.health_cache_ttl(),
            refresh_deadline: config.failover_timeout(),
            registry,
            cache,
            connector,
            clock,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// When the cached snapshot was computed
    pub async fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        match self.cache.get(&self.timestamp_key).await {
            Ok(Some(value)) => serde_json::from_value(value).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(cluster = %self.cluster, error = %e, "Failed to read health timestamp");
                None
            }
        }
    }

    /// True when no snapshot exists or it is at least one interval old.
    ///
    /// A timestamp ahead of the local clock (another process with a skewed
    /// clock wrote it) counts as age zero, so it goes stale once the local
    /// clock has moved one interval past it.
    pub async fn is_stale(&self) -> bool {
        match self.last_checked_at().await {
            None => true,
            Some(checked_at) => {
                let age = self
                    .clock
                    .now()
                    .signed_duration_since(checked_at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                age >= self.interval
            }
        }
    }

    /// Cached snapshot, empty when absent or expired
    pub async fn snapshot(&self) -> HealthSnapshot {
        match self.cache.get(&self.snapshot_key).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(cluster = %self.cluster, error = %e, "Discarding unreadable health snapshot");
                HealthSnapshot::new()
            }),
            Ok(None) => HealthSnapshot::new(),
            Err(e) => {
                warn!(cluster = %self.cluster, error = %e, "Failed to read health snapshot");
                HealthSnapshot::new()
            }
        }
    }

    /// Probe every node when the snapshot is stale.
    ///
    /// Returns whether a probe round ran.
    pub async fn refresh(&self) -> bool {
        self.refresh_if_stale().await.is_some()
    }

    /// Snapshot after a staleness-gated refresh
    pub async fn current_snapshot(&self) -> HealthSnapshot {
        match self.refresh_if_stale().await {
            Some(snapshot) => snapshot,
            None => self.snapshot().await,
        }
    }

    /// Registry nodes eligible for selection, in registry order
    pub async fn healthy_nodes(&self) -> Vec<NodeDescriptor> {
        let snapshot = self.current_snapshot().await;
        self.registry
            .iter()
            .filter(|node| snapshot.is_eligible(node.index))
            .cloned()
            .collect()
    }

    async fn refresh_if_stale(&self) -> Option<HealthSnapshot> {
        if !self.is_stale().await {
            return None;
        }

        let _guard = self.refresh_lock.lock().await;

        // Another task may have refreshed while we waited
        if !self.is_stale().await {
            debug!(cluster = %self.cluster, "Health snapshot refreshed concurrently");
            return None;
        }

        let snapshot = self.probe_all().await;
        self.store(&snapshot).await;

        let healthy = snapshot
            .iter()
            .filter(|(_, record)| record.status.is_eligible())
            .count()
            + self.registry.len().saturating_sub(snapshot.len());
        metrics::record_refresh(healthy);
        info!(
            cluster = %self.cluster,
            healthy,
            total = self.registry.len(),
            "Health snapshot refreshed"
        );

        Some(snapshot)
    }

    /// Probe all nodes concurrently under the shared refresh deadline
    async fn probe_all(&self) -> HealthSnapshot {
        // A deadline past the representable range is no deadline at all
        let deadline = self
            .refresh_deadline
            .and_then(|d| Instant::now().checked_add(d));

        let probes = self.registry.iter().map(|node| async move {
            let record = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, self.probe(node)).await {
                    Ok(record) => record,
                    Err(_) => {
                        warn!(node = %node, "Health check still pending at refresh deadline");
                        HealthRecord::unknown()
                    }
                },
                None => self.probe(node).await,
            };
            (node.index, record)
        });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe(&self, node: &NodeDescriptor) -> HealthRecord {
        let started = Instant::now();
        let outcome = tokio::time::timeout(node.timeout(), async {
            let connection = self.connector.connect(node).await?;
            let rows = connection.select(PROBE_SQL, &QueryParams::new()).await?;
            Ok::<RowSet, ConnectionError>(rows)
        })
        .await;

        let checked_at = self.clock.now();
        let record = match outcome {
            Ok(Ok(_)) => {
                let elapsed = started.elapsed().as_millis() as u64;
                debug!(node = %node, response_time_ms = elapsed, "Health check passed");
                HealthRecord::healthy(checked_at, elapsed)
            }
            Ok(Err(e)) => {
                warn!(node = %node, error = %e, "Health check failed");
                HealthRecord::unhealthy(checked_at, e.to_string())
            }
            Err(_) => {
                warn!(node = %node, timeout = ?node.timeout(), "Health check timed out");
                HealthRecord::unhealthy(checked_at, "health check timed out")
            }
        };

        metrics::record_probe(record.status.is_eligible());
        record
    }

    /// Snapshot first, then its timestamp; a reader never sees a fresh
    /// timestamp next to an old snapshot.
    async fn store(&self, snapshot: &HealthSnapshot) {
        let value = match serde_json::to_value(snapshot) {
            Ok(value) => value,
            Err(e) => {
                warn!(cluster = %self.cluster, error = %e, "Failed to encode health snapshot");
                return;
            }
        };

        if let Err(e) = self.cache.put(&self.snapshot_key, value, self.cache_ttl).await {
            warn!(cluster = %self.cluster, error = %e, "Failed to store health snapshot");
            return;
        }

        let timestamp = Value::String(self.clock.now().to_rfc3339());
        if let Err(e) = self.cache.put(&self.timestamp_key, timestamp, self.cache_ttl).await {
            warn!(cluster = %self.cluster, error = %e, "Failed to store health timestamp");
        }
    }
}

impl std::fmt::Debug for HealthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthTracker")
            .field("cluster", &self.cluster)
            .field("nodes", &self.registry.len())
            .field("interval", &self.interval)
            .field("refresh_deadline", &self.refresh_deadline)
            .finish()
    }
}
