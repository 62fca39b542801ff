//! Colonnade Core Library
//!
//! Configuration model, error type and shared value types for the Colonnade
//! cluster access layer.

pub mod config;
pub mod error;
pub mod types;

pub use config::ColonnadeConfig;
pub use error::{Error, Result};

/// Colonnade version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port of a store node
pub const DEFAULT_PORT: u16 = 8123;

/// Default number of (select node, execute) cycles per operation
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default pause between attempts (milliseconds)
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Default health snapshot lifetime (seconds)
pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 30;

/// Default deadline for one health refresh round (milliseconds)
pub const DEFAULT_FAILOVER_TIMEOUT_MS: u64 = 5000;

/// Default per-node connection timeout (seconds)
pub const DEFAULT_NODE_TIMEOUT_SECS: u64 = 30;

/// Base cache key of the health snapshot; the cluster name is appended
pub const HEALTH_CACHE_KEY: &str = "colonnade_cluster_health";
