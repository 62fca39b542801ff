//! Cluster client with bounded retry

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use colonnade_core::types::{Ack, ClusterStatusReport, QueryParams, RowSet};

use crate::cluster::ClusterManager;
use crate::connection::Connection;
use crate::error::{ClusterError, ClusterResult, ConnectionError, OperationContext};
use crate::metrics;

/// Statement used by [`ClusterClient::test_connection`]
const TEST_SQL: &str = "SELECT 1 AS test";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Select,
    Write,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Write => "write",
        }
    }

    fn failed(&self, context: OperationContext) -> ClusterError {
        match self {
            Operation::Select => ClusterError::QueryFailed(Box::new(context)),
            Operation::Write => ClusterError::WriteFailed(Box::new(context)),
        }
    }
}

/// Runs statements on the cluster, picking a node per attempt
#[derive(Debug, Clone)]
pub struct ClusterClient {
    manager: Arc<ClusterManager>,
}

impl ClusterClient {
    pub fn new(manager: Arc<ClusterManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ClusterManager> {
        &self.manager
    }

    /// Run a read query
    pub async fn select(&self, sql: &str, params: &QueryParams) -> ClusterResult<RowSet> {
        self.run(Operation::Select, sql, params, |connection| async move {
            connection.select(sql, params).await
        })
        .await
    }

    /// Run a statement that modifies data
    pub async fn write(&self, sql: &str, params: &QueryParams) -> ClusterResult<Ack> {
        self.run(Operation::Write, sql, params, |connection| async move {
            connection.write(sql, params).await
        })
        .await
    }

    /// Cluster health, refreshed when stale
    pub async fn status(&self) -> ClusterResult<ClusterStatusReport> {
        Ok(self.manager.status().await)
    }

    /// Whether a trivial query succeeds within the retry budget
    pub async fn test_connection(&self) -> bool {
        match self.select(TEST_SQL, &QueryParams::new()).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Cluster connection test failed");
                false
            }
        }
    }

    /// Select a node, connect, execute; repeat on failure until the attempt
    /// budget is spent. Running out of healthy nodes ends the loop at once.
    async fn run<T, F, Fut>(
        &self,
        operation: Operation,
        sql: &str,
        params: &QueryParams,
        execute: F,
    ) -> ClusterResult<T>
    where
        F: Fn(Box<dyn Connection>) -> Fut,
        Fut: Future<Output = Result<T, ConnectionError>>,
    {
        let config = self.manager.config();
        let max_attempts = config.max_attempts();
        let delay = config.retry_delay();
        let mut attempts = 0;
        let mut nodes_tried = Vec::new();

        loop {
            let node = self.manager.next_node().await?;
            nodes_tried.push(node.address());

            info!(
                node = %node,
                operation = operation.as_str(),
                sql,
                attempt = attempts + 1,
                "Executing on cluster node"
            );

            let result = match self.manager.connector().connect(&node).await {
                Ok(connection) => execute(connection).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(value) => {
                    metrics::record_attempt(operation.as_str(), true);
                    return Ok(value);
                }
                Err(e) => {
                    attempts += 1;
                    metrics::record_attempt(operation.as_str(), false);
                    warn!(
                        node = %node,
                        sql,
                        error = %e,
                        attempt = attempts,
                        max_attempts,
                        "Cluster {} failed",
                        operation.as_str()
                    );

                    if attempts >= max_attempts {
                        return Err(operation.failed(OperationContext {
                            sql: sql.to_string(),
                            params: params.clone(),
                            attempts,
                            max_attempts,
                            nodes_tried,
                            last_error: e.to_string(),
                        }));
                    }

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
