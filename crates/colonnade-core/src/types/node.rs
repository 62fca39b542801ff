//! Node descriptors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Connection options shared by every node of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOptions {
    /// Connection/request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Talk HTTPS instead of HTTP
    #[serde(default)]
    pub ssl: bool,
    /// Open connections in read-only mode; on unless switched off, so
    /// writes need `readonly = false`
    #[serde(default = "default_readonly")]
    pub readonly: bool,
}

fn default_timeout() -> u64 {
    crate::DEFAULT_NODE_TIMEOUT_SECS
}

fn default_readonly() -> bool {
    true
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            ssl: false,
            readonly: default_readonly(),
        }
    }
}

/// One configured node of the cluster.
///
/// Built once by the node registry and never mutated afterwards.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Position in registry order
    pub index: usize,
    pub host: String,
    pub port: u16,
    /// Relative share of traffic under weighted-random selection
    pub weight: u32,
    pub username: String,
    pub password: String,
    pub database: String,
    pub options: NodeOptions,
}

impl NodeDescriptor {
    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the node's HTTP interface
    pub fn base_url(&self) -> String {
        let scheme = if self.options.ssl { "https" } else { "http" };
        format!("{}://{}:{}/", scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.options.timeout)
    }
}

impl fmt::Display for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("index", &self.index)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("weight", &self.weight)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(ssl: bool) -> NodeDescriptor {
        NodeDescriptor {
            index: 0,
            host: "ch-1".to_string(),
            port: 8443,
            weight: 1,
            username: "default".to_string(),
            password: "secret".to_string(),
            database: "analytics".to_string(),
            options: NodeOptions {
                ssl,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_address_and_url() {
        assert_eq!(node(false).to_string(), "ch-1:8443");
        assert_eq!(node(false).base_url(), "http://ch-1:8443/");
        assert_eq!(node(true).base_url(), "https://ch-1:8443/");
        assert_eq!(node(true).timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_debug_hides_password() {
        let rendered = format!("{:?}", node(false));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_options_read_only_unless_disabled() {
        assert!(NodeOptions::default().readonly);

        let options: NodeOptions = serde_json::from_str("{}").unwrap();
        assert!(options.readonly);
        assert_eq!(options.timeout, 30);

        let options: NodeOptions = serde_json::from_str(r#"{"readonly": false}"#).unwrap();
        assert!(!options.readonly);
    }
}
