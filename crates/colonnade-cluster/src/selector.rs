//! Node selection strategies

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use colonnade_core::types::{NodeDescriptor, SelectorMode};

use crate::error::{ClusterError, ClusterResult};
use crate::health::HealthTracker;
use crate::metrics;

/// Picks the node for the next operation among the healthy ones
pub struct NodeSelector {
    mode: SelectorMode,
    tracker: Arc<HealthTracker>,
    // Round-robin position, shared by every caller in this process
    cursor: AtomicU64,
}

impl NodeSelector {
    pub fn new(mode: SelectorMode, tracker: Arc<HealthTracker>) -> Self {
        Self {
            mode,
            tracker,
            cursor: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> SelectorMode {
        self.mode
    }

    /// Select a node from the current healthy set.
    ///
    /// Fails with [`ClusterError::NoHealthyNodes`] when every node is
    /// unhealthy.
    pub async fn next(&self) -> ClusterResult<NodeDescriptor> {
        let healthy = self.tracker.healthy_nodes().await;

        match self.select_from(&healthy) {
            Some(node) => {
                debug!(node = %node, mode = %self.mode, healthy = healthy.len(), "Selected node");
                Ok(node)
            }
            None => {
                let total_nodes = self.tracker.registry().len();
                metrics::record_no_healthy_nodes();
                warn!(mode = %self.mode, total_nodes, "No healthy nodes available");
                Err(ClusterError::NoHealthyNodes { total_nodes })
            }
        }
    }

    /// Apply the selection strategy to an explicit healthy set
    pub fn select_from(&self, healthy: &[NodeDescriptor]) -> Option<NodeDescriptor> {
        if healthy.is_empty() {
            return None;
        }

        let node = match self.mode {
            SelectorMode::RoundRobin => {
                let position = self.cursor.fetch_add(1, Ordering::Relaxed);
                &healthy[(position % healthy.len() as u64) as usize]
            }
            SelectorMode::Random => weighted_random(healthy, &mut rand::rng())?,
            SelectorMode::Failover => &healthy[0],
        };

        Some(node.clone())
    }
}

impl std::fmt::Debug for NodeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSelector")
            .field("mode", &self.mode)
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

/// Weighted draw: a node is chosen with probability weight / total weight.
///
/// When every weight is zero the draw is uniform.
pub fn weighted_random<'a, R: Rng + ?Sized>(
    healthy: &'a [NodeDescriptor],
    rng: &mut R,
) -> Option<&'a NodeDescriptor> {
    if healthy.is_empty() {
        return None;
    }

    let total: u64 = healthy.iter().map(|node| u64::from(node.weight)).sum();
    if total == 0 {
        return healthy.get(rng.random_range(0..healthy.len()));
    }

    let draw = rng.random_range(1..=total);
    let mut cumulative = 0u64;
    for node in healthy {
        cumulative += u64::from(node.weight);
        if cumulative >= draw {
            return Some(node);
        }
    }

    healthy.last()
}
