//! CLI command implementations

pub mod exec;
pub mod ping;
pub mod query;
pub mod status;

use std::sync::Arc;

use anyhow::Result;
use colonnade_cluster::{ClusterClient, ClusterManager, QueryParams};
use colonnade_core::ColonnadeConfig;
use serde_json::Value;
use tracing::debug;

use crate::OutputFormat;

/// Context passed to all commands
pub struct CommandContext {
    pub config: ColonnadeConfig,
    /// Connection named on the command line
    pub connection: Option<String>,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    pub fn connection_name(&self) -> &str {
        self.connection.as_deref().unwrap_or(&self.config.default)
    }

    /// Manager for the selected connection
    pub fn manager(&self) -> Result<Arc<ClusterManager>> {
        let cluster = self.config.cluster_config(self.connection.as_deref())?;
        debug!(
            connection = %cluster.name,
            mode = %cluster.mode,
            nodes = cluster.nodes.host.len(),
            "Using cluster connection"
        );
        let manager = ClusterManager::builder(cluster).build()?;
        Ok(Arc::new(manager))
    }

    pub fn client(&self) -> Result<ClusterClient> {
        Ok(self.manager()?.client())
    }
}

/// Parse a `name=value` parameter; the value is JSON when it parses as
/// JSON, a plain string otherwise.
pub fn parse_param(raw: &str) -> std::result::Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

pub fn query_params(params: Vec<(String, Value)>) -> QueryParams {
    params
        .into_iter()
        .fold(QueryParams::new(), |acc, (name, value)| acc.with(name, value))
}
