//! Node registry - expands cluster configuration into node descriptors

use colonnade_core::config::ClusterNodesSection;
use colonnade_core::types::NodeDescriptor;

use crate::error::ClusterResult;

/// Static list of configured nodes, in configuration order
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    nodes: Vec<NodeDescriptor>,
}

impl NodeRegistry {
    /// One descriptor per host entry, carrying the port and weight at the
    /// same index plus the shared credentials and options.
    pub fn expand(section: &ClusterNodesSection) -> ClusterResult<Self> {
        section.validate()?;

        let nodes = section
            .host
            .iter()
            .enumerate()
            .map(|(index, host)| NodeDescriptor {
                index,
                host: host.trim().to_string(),
                port: section.port[index],
                weight: section.weight_of(index),
                username: section.username.clone(),
                password: section.password.clone(),
                database: section.database.clone(),
                options: section.options.clone(),
            })
            .collect();

        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn get(&self, index: usize) -> Option<&NodeDescriptor> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeDescriptor> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use colonnade_core::types::NodeOptions;

    fn section(hosts: &[&str], ports: &[u16], weights: &[u32]) -> ClusterNodesSection {
        ClusterNodesSection {
            host: hosts.iter().map(|h| h.to_string()).collect(),
            port: ports.to_vec(),
            weight: weights.to_vec(),
            username: "reader".to_string(),
            password: "pw".to_string(),
            database: "events".to_string(),
            options: NodeOptions {
                timeout: 7,
                ssl: true,
                readonly: true,
            },
        }
    }

    #[test]
    fn test_expand_preserves_order_and_index() {
        let registry =
            NodeRegistry::expand(&section(&["a", "b", "c"], &[9000, 9001, 9002], &[1, 5, 2]))
                .unwrap();

        assert_eq!(registry.len(), 3);
        let summary: Vec<(usize, &str, u16, u32)> = registry
            .iter()
            .map(|n| (n.index, n.host.as_str(), n.port, n.weight))
            .collect();
        assert_eq!(
            summary,
            vec![(0, "a", 9000, 1), (1, "b", 9001, 5), (2, "c", 9002, 2)]
        );

        for node in registry.iter() {
            assert_eq!(node.username, "reader");
            assert_eq!(node.database, "events");
            assert_eq!(node.options.timeout, 7);
            assert!(node.options.readonly);
        }
    }

    #[test]
    fn test_expand_single_node() {
        let registry = NodeRegistry::expand(&section(&["solo"], &[8123], &[])).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().weight, 1);
        assert!(registry.get(1).is_none());
    }

    #[test]
    fn test_expand_rejects_mismatched_arrays() {
        let err = NodeRegistry::expand(&section(&["a", "b"], &[8123], &[1, 1])).unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));

        let err = NodeRegistry::expand(&section(&["a", "b"], &[8123, 8123], &[1])).unwrap_err();
        assert!(matches!(err, ClusterError::Config(_)));
    }

    #[test]
    fn test_expand_trims_hosts() {
        let registry = NodeRegistry::expand(&section(&[" a "], &[8123], &[2])).unwrap();
        assert_eq!(registry.get(0).unwrap().host, "a");
    }
}
