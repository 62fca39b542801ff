//! Cluster error types

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use colonnade_core::types::QueryParams;

/// Result type for cluster operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Failure of a single connect or execute call against one node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Everything known about an operation that exhausted its attempt budget
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationContext {
    pub sql: String,
    pub params: QueryParams,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Address of the node used by each attempt, in order
    pub nodes_tried: Vec<String>,
    pub last_error: String,
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "after {} attempts: {}",
            self.max_attempts, self.last_error
        )
    }
}

/// Cluster-related errors
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error(transparent)]
    Config(#[from] colonnade_core::Error),

    #[error("No healthy nodes available ({total_nodes} configured)")]
    NoHealthyNodes { total_nodes: usize },

    #[error("Query failed {0}")]
    QueryFailed(Box<OperationContext>),

    #[error("Write operation failed {0}")]
    WriteFailed(Box<OperationContext>),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl ClusterError {
    /// Numeric error code
    pub fn code(&self) -> u32 {
        match self {
            ClusterError::Connection(_) => 1001,
            ClusterError::QueryFailed(_) | ClusterError::WriteFailed(_) => 1002,
            ClusterError::Config(e) => e.code(),
            ClusterError::NoHealthyNodes { .. } => 1005,
            ClusterError::Cache(_) => 1010,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ClusterError::Connection(_) => "Connection Error",
            ClusterError::QueryFailed(_) | ClusterError::WriteFailed(_) => "Query Error",
            ClusterError::Config(e) => e.error_type(),
            ClusterError::NoHealthyNodes { .. } => "Cluster Error",
            ClusterError::Cache(_) => "Resource Error",
        }
    }

    /// Attempt context of a query or write that ran out of attempts
    pub fn operation_context(&self) -> Option<&OperationContext> {
        match self {
            ClusterError::QueryFailed(context) | ClusterError::WriteFailed(context) => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Structured context for diagnostics output
    pub fn context(&self) -> Value {
        match self {
            ClusterError::QueryFailed(context) | ClusterError::WriteFailed(context) => {
                serde_json::to_value(context.as_ref()).unwrap_or(Value::Null)
            }
            ClusterError::NoHealthyNodes { total_nodes } => {
                json!({ "available_nodes": total_nodes })
            }
            _ => Value::Null,
        }
    }
}
