//! Configuration for Colonnade
//!
//! Example file:
//! ```toml
//! default = "cluster"
//!
//! [connections.cluster]
//! mode = "round_robin"
//!
//! [connections.cluster.nodes]
//! host = ["node1", "node2"]
//! port = [8123, 8123]
//! weight = [1, 1]
//! username = "default"
//! password = "clickhouse"
//! database = "default"
//!
//! [connections.cluster.options]
//! retry_attempts = 3
//! retry_delay = 1000
//! health_check_interval = 30
//! failover_timeout = 5000
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{ClusterConfig, NodeOptions, SelectorMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonnadeConfig {
    /// Connection used when none is named explicitly
    #[serde(default = "default_connection_name")]
    pub default: String,

    #[serde(default)]
    pub connections: BTreeMap<String, ClusterConnectionSection>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_connection_name() -> String {
    "cluster".to_string()
}

impl Default for ColonnadeConfig {
    fn default() -> Self {
        let mut connections = BTreeMap::new();
        connections.insert(default_connection_name(), ClusterConnectionSection::default());

        Self {
            default: default_connection_name(),
            connections,
            logging: LoggingConfig::default(),
        }
    }
}

impl ColonnadeConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))
    }

    /// Defaults overlaid with `COLONNADE_*` environment variables.
    ///
    /// The variables target the connection named by `COLONNADE_CONNECTION`
    /// (the default connection otherwise).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("COLONNADE_CONNECTION") {
            config.default = name;
        }
        if let Ok(level) = std::env::var("COLONNADE_LOG_LEVEL") {
            config.logging.level = level;
        }

        let section = config.connections.entry(config.default.clone()).or_default();
        let nodes = &mut section.nodes;

        if let Ok(mode) = std::env::var("COLONNADE_CLUSTER_MODE") {
            section.mode = Some(mode);
        }
        if let Ok(hosts) = std::env::var("COLONNADE_CLUSTER_NODES") {
            nodes.host = parse_list("COLONNADE_CLUSTER_NODES", &hosts)?;
        }
        if let Ok(ports) = std::env::var("COLONNADE_CLUSTER_PORTS") {
            nodes.port = parse_list("COLONNADE_CLUSTER_PORTS", &ports)?;
        }
        if let Ok(weights) = std::env::var("COLONNADE_CLUSTER_WEIGHTS") {
            nodes.weight = parse_list("COLONNADE_CLUSTER_WEIGHTS", &weights)?;
        }
        if let Ok(username) = std::env::var("COLONNADE_USERNAME") {
            nodes.username = username;
        }
        if let Ok(password) = std::env::var("COLONNADE_PASSWORD") {
            nodes.password = password;
        }
        if let Ok(database) = std::env::var("COLONNADE_DATABASE") {
            nodes.database = database;
        }
        if let Ok(timeout) = std::env::var("COLONNADE_TIMEOUT") {
            nodes.options.timeout = parse_value("COLONNADE_TIMEOUT", &timeout)?;
        }
        if let Ok(ssl) = std::env::var("COLONNADE_SSL") {
            nodes.options.ssl = parse_flag(&ssl);
        }
        if let Ok(readonly) = std::env::var("COLONNADE_READONLY") {
            nodes.options.readonly = parse_flag(&readonly);
        }

        let options = &mut section.options;
        if let Ok(v) = std::env::var("COLONNADE_CLUSTER_RETRY_ATTEMPTS") {
            options.retry_attempts = parse_value("COLONNADE_CLUSTER_RETRY_ATTEMPTS", &v)?;
        }
        if let Ok(v) = std::env::var("COLONNADE_CLUSTER_RETRY_DELAY") {
            options.retry_delay = parse_value("COLONNADE_CLUSTER_RETRY_DELAY", &v)?;
        }
        if let Ok(v) = std::env::var("COLONNADE_CLUSTER_HEALTH_CHECK_INTERVAL") {
            options.health_check_interval =
                parse_value("COLONNADE_CLUSTER_HEALTH_CHECK_INTERVAL", &v)?;
        }
        if let Ok(v) = std::env::var("COLONNADE_CLUSTER_FAILOVER_TIMEOUT") {
            options.failover_timeout = parse_value("COLONNADE_CLUSTER_FAILOVER_TIMEOUT", &v)?;
        }

        Ok(config)
    }

    /// Look up a connection by name, falling back to the default one
    pub fn connection(&self, name: Option<&str>) -> Result<(&str, &ClusterConnectionSection)> {
        let name = name.unwrap_or(&self.default);
        self.connections
            .get_key_value(name)
            .map(|(name, section)| (name.as_str(), section))
            .ok_or_else(|| Error::configuration(format!("Connection '{}' is not configured", name)))
    }

    /// Validated cluster configuration of a named connection
    pub fn cluster_config(&self, name: Option<&str>) -> Result<ClusterConfig> {
        let (name, section) = self.connection(name)?;
        section.to_cluster_config(name)
    }
}

fn parse_list<T: FromStr>(var: &str, raw: &str) -> Result<Vec<T>> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_value(var, item))
        .collect()
}

fn parse_value<T: FromStr>(var: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::configuration(format!("Invalid value '{}' in {}", raw, var)))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// One cluster connection as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConnectionSection {
    /// round_robin, random or failover; absent for single-node connections
    pub mode: Option<String>,

    #[serde(default)]
    pub nodes: ClusterNodesSection,

    #[serde(default)]
    pub options: ClusterOptionsSection,
}

impl Default for ClusterConnectionSection {
    fn default() -> Self {
        Self {
            mode: Some(SelectorMode::RoundRobin.as_str().to_string()),
            nodes: ClusterNodesSection::default(),
            options: ClusterOptionsSection::default(),
        }
    }
}

impl ClusterConnectionSection {
    /// Convert to ClusterConfig for the cluster module
    pub fn to_cluster_config(&self, name: &str) -> Result<ClusterConfig> {
        let mode = match self.mode.as_deref().map(str::trim) {
            Some(mode) if !mode.is_empty() => mode.parse::<SelectorMode>()?,
            _ => {
                return Err(Error::configuration(format!(
                    "Connection '{}' is not configured for cluster mode",
                    name
                )))
            }
        };

        self.nodes.validate()?;

        Ok(ClusterConfig {
            name: name.to_string(),
            mode,
            nodes: self.nodes.clone(),
            retry_attempts: self.options.retry_attempts,
            retry_delay_ms: self.options.retry_delay,
            health_check_interval_secs: self.options.health_check_interval,
            failover_timeout_ms: self.options.failover_timeout,
        })
    }
}

/// Parallel node arrays plus the parameters every node shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterNodesSection {
    #[serde(default)]
    pub host: Vec<String>,

    #[serde(default)]
    pub port: Vec<u16>,

    /// May be omitted entirely, every node then weighs 1
    #[serde(default)]
    pub weight: Vec<u32>,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub options: NodeOptions,
}

fn default_username() -> String {
    "default".to_string()
}

fn default_database() -> String {
    "default".to_string()
}

impl Default for ClusterNodesSection {
    fn default() -> Self {
        Self {
            host: vec!["node1".to_string(), "node2".to_string()],
            port: vec![crate::DEFAULT_PORT, crate::DEFAULT_PORT],
            weight: vec![1, 1],
            username: default_username(),
            password: String::new(),
            database: default_database(),
            options: NodeOptions::default(),
        }
    }
}

impl ClusterNodesSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::configuration("Cluster has no nodes configured"));
        }
        if self.port.len() != self.host.len() {
            return Err(Error::configuration(format!(
                "Cluster node arrays mismatch: {} hosts but {} ports",
                self.host.len(),
                self.port.len()
            )));
        }
        if !self.weight.is_empty() && self.weight.len() != self.host.len() {
            return Err(Error::configuration(format!(
                "Cluster node arrays mismatch: {} hosts but {} weights",
                self.host.len(),
                self.weight.len()
            )));
        }
        if let Some(index) = self.host.iter().position(|h| h.trim().is_empty()) {
            return Err(Error::configuration(format!("Cluster node {} has an empty host", index)));
        }
        Ok(())
    }

    /// Weight of the node at `index`, 1 when weights are omitted
    pub fn weight_of(&self, index: usize) -> u32 {
        self.weight.get(index).copied().unwrap_or(1)
    }
}

/// Retry and health-check tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterOptionsSection {
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Seconds
    #[serde(default = "default_health_check_interval")]
    pub health_check_interval: u64,

    /// Milliseconds
    #[serde(default = "default_failover_timeout")]
    pub failover_timeout: u64,
}

fn default_retry_attempts() -> u32 {
    crate::DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_delay() -> u64 {
    crate::DEFAULT_RETRY_DELAY_MS
}

fn default_health_check_interval() -> u64 {
    crate::DEFAULT_HEALTH_CHECK_INTERVAL_SECS
}

fn default_failover_timeout() -> u64 {
    crate::DEFAULT_FAILOVER_TIMEOUT_MS
}

impl Default for ClusterOptionsSection {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_delay: default_retry_delay(),
            health_check_interval: default_health_check_interval(),
            failover_timeout: default_failover_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// pretty or json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        default = "analytics"

        [logging]
        level = "debug"
        format = "json"

        [connections.analytics]
        mode = "failover"

        [connections.analytics.nodes]
        host = ["ch-a", "ch-b", "ch-c"]
        port = [8123, 8124, 8125]
        weight = [1, 3, 1]
        username = "reader"
        password = "pw"
        database = "events"

        [connections.analytics.nodes.options]
        timeout = 5
        ssl = true
        readonly = true

        [connections.analytics.options]
        retry_attempts = 2
        retry_delay = 250
        health_check_interval = 10

        [connections.single]
        [connections.single.nodes]
        host = ["localhost"]
        port = [8123]
    "#;

    #[test]
    fn test_parse_file() {
        let config = ColonnadeConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.logging.format, "json");

        let cluster = config.cluster_config(None).unwrap();
        assert_eq!(cluster.name, "analytics");
        assert_eq!(cluster.mode, SelectorMode::Failover);
        assert_eq!(cluster.nodes.host, vec!["ch-a", "ch-b", "ch-c"]);
        assert_eq!(cluster.nodes.weight_of(1), 3);
        assert!(cluster.nodes.options.ssl);
        assert_eq!(cluster.nodes.options.timeout, 5);
        assert_eq!(cluster.retry_attempts, 2);
        assert_eq!(cluster.retry_delay_ms, 250);
        assert_eq!(cluster.health_check_interval_secs, 10);
        assert_eq!(cluster.failover_timeout_ms, crate::DEFAULT_FAILOVER_TIMEOUT_MS);
        assert_eq!(cluster.health_cache_key(), "colonnade_cluster_health:analytics");
    }

    #[test]
    fn test_connection_without_mode_is_rejected() {
        let config = ColonnadeConfig::from_toml(SAMPLE).unwrap();
        let err = config.cluster_config(Some("single")).unwrap_err();
        assert!(err.to_string().contains("not configured for cluster mode"));
    }

    #[test]
    fn test_unknown_connection() {
        let config = ColonnadeConfig::from_toml(SAMPLE).unwrap();
        assert!(matches!(
            config.cluster_config(Some("nope")),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file_is_resource_error() {
        let path = std::env::temp_dir().join("colonnade-missing-config.toml");
        let err = ColonnadeConfig::from_file(&path.to_string_lossy()).unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.code(), 1010);
        assert_eq!(err.error_type(), "Resource Error");
        assert!(err.to_string().contains("colonnade-missing-config.toml"));
    }

    #[test]
    fn test_unknown_mode_fails_fast() {
        let section = ClusterConnectionSection {
            mode: Some("sticky".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            section.to_cluster_config("cluster"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_mismatched_arrays() {
        let mut nodes = ClusterNodesSection::default();
        nodes.port = vec![8123];
        assert!(nodes.validate().unwrap_err().to_string().contains("2 hosts but 1 ports"));

        let mut nodes = ClusterNodesSection::default();
        nodes.weight = vec![1, 2, 3];
        assert!(nodes.validate().unwrap_err().to_string().contains("weights"));

        let mut nodes = ClusterNodesSection::default();
        nodes.weight.clear();
        assert!(nodes.validate().is_ok());
        assert_eq!(nodes.weight_of(1), 1);
    }

    #[test]
    fn test_empty_cluster_rejected() {
        let nodes = ClusterNodesSection {
            host: vec![],
            port: vec![],
            weight: vec![],
            ..Default::default()
        };
        assert!(nodes.validate().is_err());
    }

    #[test]
    fn test_parse_list() {
        let ports: Vec<u16> = parse_list("P", "8123, 8124,").unwrap();
        assert_eq!(ports, vec![8123, 8124]);
        assert!(parse_list::<u16>("P", "8123,abc").is_err());
    }

    #[test]
    fn test_defaults_mirror_two_node_cluster() {
        let config = ColonnadeConfig::default();
        let cluster = config.cluster_config(None).unwrap();
        assert_eq!(cluster.mode, SelectorMode::RoundRobin);
        assert_eq!(cluster.nodes.host.len(), 2);
        assert_eq!(cluster.max_attempts(), 3);
        assert_eq!(cluster.retry_delay_ms, 1000);
        assert_eq!(cluster.health_check_interval_secs, 30);
    }
}
