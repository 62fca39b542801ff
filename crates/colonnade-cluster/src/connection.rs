//! Store connection seam
//!
//! The client and the health tracker never talk to a node directly; they ask
//! a [`Connector`] for a fresh [`Connection`] to the node they picked.

use async_trait::async_trait;

use colonnade_core::types::{Ack, NodeDescriptor, QueryParams, RowSet};

use crate::error::ConnectionError;

/// An open connection to one node
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a read query and return its rows
    async fn select(&self, sql: &str, params: &QueryParams) -> Result<RowSet, ConnectionError>;

    /// Run a statement that modifies data
    async fn write(&self, sql: &str, params: &QueryParams) -> Result<Ack, ConnectionError>;
}

/// Opens connections honouring the node's ssl, timeout and readonly options
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn Connection>, ConnectionError>;
}
