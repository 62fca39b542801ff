//! Cluster metrics
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding application.

use metrics::{counter, gauge};

/// Metric names
pub mod names {
    pub const ATTEMPTS_TOTAL: &str = "colonnade_cluster_attempts_total";
    pub const PROBES_TOTAL: &str = "colonnade_cluster_probes_total";
    pub const HEALTHY_NODES: &str = "colonnade_cluster_healthy_nodes";
    pub const NO_HEALTHY_NODES_TOTAL: &str = "colonnade_cluster_no_healthy_nodes_total";
    pub const REFRESHES_TOTAL: &str = "colonnade_cluster_refreshes_total";
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// One execution attempt of a select or write
pub fn record_attempt(operation: &'static str, success: bool) {
    counter!(
        names::ATTEMPTS_TOTAL,
        "operation" => operation,
        "outcome" => outcome(success)
    )
    .increment(1);
}

pub fn record_probe(success: bool) {
    counter!(names::PROBES_TOTAL, "outcome" => outcome(success)).increment(1);
}

pub fn record_refresh(healthy_nodes: usize) {
    counter!(names::REFRESHES_TOTAL).increment(1);
    gauge!(names::HEALTHY_NODES).set(healthy_nodes as f64);
}

pub fn record_no_healthy_nodes() {
    counter!(names::NO_HEALTHY_NODES_TOTAL).increment(1);
}
