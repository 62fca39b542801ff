//! In-memory test doubles

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use colonnade_core::config::ClusterNodesSection;
use colonnade_core::types::{Ack, ClusterConfig, NodeDescriptor, QueryParams, Row, RowSet, SelectorMode};

use crate::cache::MemoryCache;
use crate::clock::ManualClock;
use crate::cluster::ClusterManager;
use crate::connection::{Connection, Connector};
use crate::error::ConnectionError;
use crate::health::{HealthTracker, PROBE_SQL};
use crate::registry::NodeRegistry;

#[derive(Debug, Default)]
struct Script {
    /// Refuse connections
    down: HashSet<String>,
    /// Accept connections and pass probes, fail every statement
    flaky: HashSet<String>,
    /// Never answer
    hanging: HashSet<String>,
    probes: usize,
    /// Host of every executed statement, in order
    executions: Vec<String>,
}

/// Connector whose nodes behave as the test scripts them
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn toggle(set: &mut HashSet<String>, host: &str, on: bool) {
        if on {
            set.insert(host.to_string());
        } else {
            set.remove(host);
        }
    }

    pub fn set_down(&self, host: &str, down: bool) {
        Self::toggle(&mut self.script.lock().down, host, down);
    }

    pub fn set_flaky(&self, host: &str, flaky: bool) {
        Self::toggle(&mut self.script.lock().flaky, host, flaky);
    }

    pub fn set_hanging(&self, host: &str, hanging: bool) {
        Self::toggle(&mut self.script.lock().hanging, host, hanging);
    }

    pub fn probe_count(&self) -> usize {
        self.script.lock().probes
    }

    pub fn executions(&self) -> Vec<String> {
        self.script.lock().executions.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn Connection>, ConnectionError> {
        if self.script.lock().down.contains(&node.host) {
            return Err(ConnectionError::Transport(format!(
                "connection refused: {}",
                node.address()
            )));
        }

        Ok(Box::new(ScriptedConnection {
            host: node.host.clone(),
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    host: String,
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    async fn run(&self, sql: &str) -> Result<Row, ConnectionError> {
        let hanging = {
            let mut script = self.script.lock();
            if sql == PROBE_SQL {
                script.probes += 1;
            } else {
                script.executions.push(self.host.clone());
            }
            script.hanging.contains(&self.host)
        };

        if hanging {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if sql != PROBE_SQL && self.script.lock().flaky.contains(&self.host) {
            return Err(ConnectionError::Remote {
                status: 500,
                message: format!("boom on {}", self.host),
            });
        }

        let mut row = Row::new();
        row.insert("node".to_string(), json!(self.host));
        row.insert("health_check".to_string(), json!(1));
        Ok(row)
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn select(&self, sql: &str, _params: &QueryParams) -> Result<RowSet, ConnectionError> {
        self.run(sql).await.map(|row| RowSet::new(vec![row]))
    }

    async fn write(&self, sql: &str, _params: &QueryParams) -> Result<Ack, ConnectionError> {
        self.run(sql).await.map(|_| Ack {
            summary: Some(format!("written on {}", self.host)),
        })
    }
}

/// Cluster of `hosts` on port 8123 with default tuning
pub fn cluster_config(mode: SelectorMode, hosts: &[&str]) -> ClusterConfig {
    ClusterConfig {
        name: "test".to_string(),
        mode,
        nodes: ClusterNodesSection {
            host: hosts.iter().map(|h| h.to_string()).collect(),
            port: vec![8123; hosts.len()],
            weight: Vec::new(),
            ..Default::default()
        },
        retry_attempts: 3,
        retry_delay_ms: 1000,
        health_check_interval_secs: 30,
        failover_timeout_ms: 5000,
    }
}

/// Tracker over a fresh memory cache
pub fn tracker(
    config: ClusterConfig,
    connector: &ScriptedConnector,
    clock: &ManualClock,
) -> Arc<HealthTracker> {
    let registry = Arc::new(NodeRegistry::expand(&config.nodes).expect("valid test cluster"));
    Arc::new(HealthTracker::new(
        &config,
        registry,
        Arc::new(MemoryCache::new()),
        Arc::new(connector.clone()),
        Arc::new(clock.clone()),
    ))
}

/// Manager over a fresh memory cache
pub fn manager(
    config: ClusterConfig,
    connector: &ScriptedConnector,
    clock: &ManualClock,
) -> Arc<ClusterManager> {
    let manager = ClusterManager::builder(config)
        .connector(Arc::new(connector.clone()))
        .cache(Arc::new(MemoryCache::new()))
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("valid test cluster");
    Arc::new(manager)
}
