//! Colonnade Cluster - health-aware access to a replicated store cluster
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ClusterClient                           │
//! │          select / write / status / test_connection          │
//! │                 bounded retry, one node per attempt         │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┴──────────────────────────────┐
//! │                     ClusterManager                          │
//! │                                                             │
//! │  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐    │
//! │  │ NodeRegistry  │  │ HealthTracker │  │ NodeSelector  │    │
//! │  │               │  │               │  │               │    │
//! │  │ - Node list   │  │ - Probes      │  │ - Round robin │    │
//! │  │ - Weights     │  │ - Snapshot    │  │ - Weighted    │    │
//! │  │               │  │ - Staleness   │  │ - Failover    │    │
//! │  └───────────────┘  └───────┬───────┘  └───────────────┘    │
//! │                             │                               │
//! │                    ┌────────┴────────┐                      │
//! │                    │   SharedCache   │                      │
//! │                    └─────────────────┘                      │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │
//!                       ┌────────┴────────┐
//!                       │    Connector    │
//!                       │     (HTTP)      │
//!                       └─────────────────┘
//! ```
//!
//! # Features
//!
//! - **Health Snapshots**: Concurrent probes, cached for the check interval
//! - **Selection Modes**: Round-robin, weighted random, or failover
//! - **Bounded Retry**: A fresh node per attempt, fixed pause in between
//! - **Pluggable Seams**: Cache, connector and clock are traits

mod cache;
mod client;
mod clock;
mod cluster;
mod connection;
mod error;
mod health;
pub mod metrics;
mod registry;
mod selector;
mod transport;

#[cfg(test)]
mod testing;

pub use cache::{MemoryCache, SharedCache};
pub use client::ClusterClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use cluster::{ClusterManager, ClusterManagerBuilder};
pub use connection::{Connection, Connector};
pub use error::{ClusterError, ClusterResult, ConnectionError, OperationContext};
pub use health::{HealthTracker, PROBE_SQL};
pub use registry::NodeRegistry;
pub use selector::{weighted_random, NodeSelector};
pub use transport::{HttpConnection, HttpConnector, HttpConnectorConfig};

// Re-export types from core
pub use colonnade_core::types::{
    Ack, ClusterConfig, ClusterStatusReport, HealthRecord, HealthSnapshot, HealthStatus,
    NodeDescriptor, NodeStatusReport, QueryParams, RowSet, SelectorMode,
};
