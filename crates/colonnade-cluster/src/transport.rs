//! HTTP transport to store nodes
//!
//! Speaks the store's HTTP interface:
//! - SQL sent as the POST body
//! - Database, readonly flag and bound parameters in the query string
//! - Credentials in `X-ClickHouse-User` / `X-ClickHouse-Key` headers
//! - Select results read as `JSONEachRow`, one JSON object per line
//! - Per-request timeout taken from the node options

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use tracing::debug;

use colonnade_core::types::{Ack, NodeDescriptor, QueryParams, Row, RowSet};

use crate::connection::{Connection, Connector};
use crate::error::{ClusterError, ClusterResult, ConnectionError};

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";
const SUMMARY_HEADER: &str = "X-ClickHouse-Summary";

/// HTTP client configuration shared by every node connection
#[derive(Debug, Clone)]
pub struct HttpConnectorConfig {
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    /// Verify TLS certificates on ssl nodes
    pub verify_tls: bool,
}

impl Default for HttpConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            pool_idle_timeout: Duration::from_secs(90),
            verify_tls: true,
        }
    }
}

/// Connector over the store's HTTP interface
#[derive(Clone)]
pub struct HttpConnector {
    client: Client,
    config: HttpConnectorConfig,
}

impl HttpConnector {
    pub fn new(config: HttpConnectorConfig) -> ClusterResult<Self> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout);

        if !config.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| ClusterError::Connection(ConnectionError::Transport(e.to_string())))?;

        Ok(Self { client, config })
    }
}

impl std::fmt::Debug for HttpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnector")
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, node: &NodeDescriptor) -> Result<Box<dyn Connection>, ConnectionError> {
        // reqwest pools sockets per host, a connection is just a handle
        Ok(Box::new(HttpConnection {
            client: self.client.clone(),
            node: node.clone(),
        }))
    }
}

/// Requests against one node
pub struct HttpConnection {
    client: Client,
    node: NodeDescriptor,
}

impl HttpConnection {
    async fn execute(
        &self,
        sql: &str,
        params: &QueryParams,
        select: bool,
    ) -> Result<reqwest::Response, ConnectionError> {
        let timeout = self.node.timeout();
        debug!(node = %self.node, select, "Sending statement");

        let response = self
            .client
            .post(self.node.base_url())
            .query(&query_pairs(&self.node, params, select))
            .header(USER_HEADER, &self.node.username)
            .header(KEY_HEADER, &self.node.password)
            .timeout(timeout)
            .body(sql.to_string())
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectionError::Remote {
                status,
                message: message.trim().to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn select(&self, sql: &str, params: &QueryParams) -> Result<RowSet, ConnectionError> {
        let response = self.execute(sql, params, true).await?;
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, self.node.timeout()))?;

        parse_rows(&body)
    }

    async fn write(&self, sql: &str, params: &QueryParams) -> Result<Ack, ConnectionError> {
        let response = self.execute(sql, params, false).await?;
        let summary = response
            .headers()
            .get(SUMMARY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Ok(Ack { summary })
    }
}

fn map_transport_error(error: reqwest::Error, timeout: Duration) -> ConnectionError {
    if error.is_timeout() {
        ConnectionError::Timeout(timeout)
    } else {
        ConnectionError::Transport(error.to_string())
    }
}

/// Query-string pairs of one request
fn query_pairs(node: &NodeDescriptor, params: &QueryParams, select: bool) -> Vec<(String, String)> {
    let mut pairs = vec![("database".to_string(), node.database.clone())];

    if node.options.readonly {
        pairs.push(("readonly".to_string(), "1".to_string()));
    }
    if select {
        pairs.push(("default_format".to_string(), "JSONEachRow".to_string()));
    }

    for (name, value) in params.iter() {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Null => "\\N".to_string(),
            other => other.to_string(),
        };
        pairs.push((format!("param_{}", name), value));
    }

    pairs
}

/// Decode a `JSONEachRow` body
fn parse_rows(body: &str) -> Result<RowSet, ConnectionError> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str::<Row>(line)
                .map_err(|e| ConnectionError::Decode(format!("{}: {}", e, line)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RowSet::new)
}
