//! Cluster manager
//!
//! Wires the registry, health tracker and selector of one cluster connection
//! together and hands out [`ClusterClient`]s.

use std::sync::Arc;

use tracing::info;

use colonnade_core::types::{
    ClusterConfig, ClusterStatusReport, HealthStatus, NodeDescriptor, NodeStatusReport,
};

use crate::cache::{MemoryCache, SharedCache};
use crate::client::ClusterClient;
use crate::clock::{Clock, SystemClock};
use crate::connection::Connector;
use crate::error::ClusterResult;
use crate::health::HealthTracker;
use crate::registry::NodeRegistry;
use crate::selector::NodeSelector;
use crate::transport::{HttpConnector, HttpConnectorConfig};

/// Cluster manager for one configured cluster
pub struct ClusterManager {
    config: ClusterConfig,
    registry: Arc<NodeRegistry>,
    tracker: Arc<HealthTracker>,
    selector: NodeSelector,
    connector: Arc<dyn Connector>,
}

impl ClusterManager {
    /// Create a manager using the system clock
    pub fn new(
        config: ClusterConfig,
        connector: Arc<dyn Connector>,
        cache: Arc<dyn SharedCache>,
    ) -> ClusterResult<Self> {
        Self::with_clock(config, connector, cache, Arc::new(SystemClock))
    }

    /// Create a manager with an explicit clock.
    ///
    /// Nodes are not probed here; the first selection or status call does.
    pub fn with_clock(
        config: ClusterConfig,
        connector: Arc<dyn Connector>,
        cache: Arc<dyn SharedCache>,
        clock: Arc<dyn Clock>,
    ) -> ClusterResult<Self> {
        let registry = Arc::new(NodeRegistry::expand(&config.nodes)?);
        let tracker = Arc::new(HealthTracker::new(
            &config,
            registry.clone(),
            cache,
            connector.clone(),
            clock,
        ));
        let selector = NodeSelector::new(config.mode, tracker.clone());

        info!(
            "Cluster '{}' initialized: {} nodes, {} mode",
            config.name,
            registry.len(),
            config.mode
        );

        Ok(Self {
            config,
            registry,
            tracker,
            selector,
            connector,
        })
    }

    pub fn builder(config: ClusterConfig) -> ClusterManagerBuilder {
        ClusterManagerBuilder::new(config)
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &HealthTracker {
        &self.tracker
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    /// Node for the next operation
    pub async fn next_node(&self) -> ClusterResult<NodeDescriptor> {
        self.selector.next().await
    }

    pub async fn healthy_nodes(&self) -> Vec<NodeDescriptor> {
        self.tracker.healthy_nodes().await
    }

    /// Per-node health after a staleness-gated refresh
    pub async fn status(&self) -> ClusterStatusReport {
        let snapshot = self.tracker.current_snapshot().await;

        let nodes: Vec<NodeStatusReport> = self
            .registry
            .iter()
            .map(|node| {
                let record = snapshot.get(node.index);
                NodeStatusReport {
                    host: node.host.clone(),
                    port: node.port,
                    status: snapshot.status_of(node.index),
                    last_check: record.and_then(|r| r.last_checked_at),
                    error: record.and_then(|r| r.error.clone()),
                }
            })
            .collect();

        let healthy_nodes = nodes
            .iter()
            .filter(|node| node.status == HealthStatus::Healthy)
            .count();

        ClusterStatusReport {
            mode: self.config.mode,
            total_nodes: nodes.len(),
            healthy_nodes,
            unhealthy_nodes: nodes.len() - healthy_nodes,
            nodes,
        }
    }

    /// Client running operations against this cluster
    pub fn client(self: &Arc<Self>) -> ClusterClient {
        ClusterClient::new(self.clone())
    }
}

impl std::fmt::Debug for ClusterManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterManager")
            .field("cluster", &self.config.name)
            .field("mode", &self.config.mode)
            .field("nodes", &self.registry.len())
            .finish()
    }
}

/// Builder for ClusterManager
pub struct ClusterManagerBuilder {
    config: ClusterConfig,
    connector: Option<Arc<dyn Connector>>,
    cache: Option<Arc<dyn SharedCache>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClusterManagerBuilder {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            connector: None,
            cache: None,
            clock: None,
        }
    }

    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn SharedCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults: HTTP connector, in-process cache, system clock
    pub fn build(self) -> ClusterResult<ClusterManager> {
        let connector = match self.connector {
            Some(connector) => connector,
            None => Arc::new(HttpConnector::new(HttpConnectorConfig::default())?),
        };
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MemoryCache::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        ClusterManager::with_clock(self.config, connector, cache, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ClusterError;
    use crate::testing::{cluster_config, manager, ScriptedConnector};
    use colonnade_core::types::SelectorMode;
    use std::time::Duration;

    #[test]
    fn test_builder_defaults() {
        let manager = ClusterManager::builder(cluster_config(SelectorMode::Random, &["a", "b"]))
            .build()
            .unwrap();

        assert_eq!(manager.registry().len(), 2);
        assert_eq!(manager.config().mode, SelectorMode::Random);
    }

    #[test]
    fn test_invalid_nodes_rejected() {
        let mut config = cluster_config(SelectorMode::RoundRobin, &["a", "b"]);
        config.nodes.port = vec![8123];

        let err = ClusterManager::builder(config).build().unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));
        assert_eq!(err.code(), 1003);
    }

    #[tokio::test]
    async fn test_construction_does_not_probe() {
        let connector = ScriptedConnector::new();
        let clock = ManualClock::default();
        let manager = manager(
            cluster_config(SelectorMode::RoundRobin, &["a", "b"]),
            &connector,
            &clock,
        );
        assert_eq!(connector.probe_count(), 0);

        manager.next_node().await.unwrap();
        assert_eq!(connector.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_status_report() {
        let connector = ScriptedConnector::new();
        connector.set_down("b", true);
        let clock = ManualClock::default();
        let manager = manager(
            cluster_config(SelectorMode::Failover, &["a", "b", "c"]),
            &connector,
            &clock,
        );

        let report = manager.status().await;
        assert_eq!(report.mode, SelectorMode::Failover);
        assert_eq!(report.total_nodes, 3);
        assert_eq!(report.healthy_nodes, 2);
        assert_eq!(report.unhealthy_nodes, 1);
        assert!(report.is_operational());
        assert!(!report.is_fully_healthy());

        let b = &report.nodes[1];
        assert_eq!((b.host.as_str(), b.port), ("b", 8123));
        assert_eq!(b.status, HealthStatus::Unhealthy);
        assert_eq!(b.last_check, Some(clock.now()));
        assert!(b.error.is_some());
        assert!(report.nodes[0].error.is_none());
    }

    #[tokio::test]
    async fn test_status_idempotent_within_interval() {
        let connector = ScriptedConnector::new();
        connector.set_down("c", true);
        let clock = ManualClock::default();
        let manager = manager(
            cluster_config(SelectorMode::RoundRobin, &["a", "b", "c"]),
            &connector,
            &clock,
        );

        let first = manager.status().await;
        let probes = connector.probe_count();
        clock.advance(Duration::from_secs(10));
        connector.set_down("c", false);
        let second = manager.status().await;

        assert_eq!(first, second);
        assert_eq!(first.unhealthy_nodes, 1);
        assert_eq!(connector.probe_count(), probes);

        clock.advance(Duration::from_secs(20));
        let third = manager.status().await;
        assert_eq!(third.healthy_nodes, 3);
        assert!(third.is_fully_healthy());
    }
}
