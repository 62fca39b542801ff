//! status command - cluster health summary

use anyhow::Result;
use colored::Colorize;
use colonnade_cluster::{ClusterStatusReport, HealthStatus};

use super::CommandContext;
use crate::utils::{format_datetime, render_table};

pub async fn execute(ctx: &CommandContext, detailed: bool) -> Result<()> {
    let client = ctx.client()?;
    let report = client.status().await?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render(&report, detailed));
    }

    Ok(())
}

fn status_icon(status: HealthStatus) -> &'static str {
    if status == HealthStatus::Healthy {
        "✅"
    } else {
        "❌"
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render(report: &ClusterStatusReport, detailed: bool) -> String {
    let mut out = Vec::new();

    out.push("🔍 Cluster Status".green().bold().to_string());
    out.push(String::new());
    out.push("📊 Cluster Information:".green().to_string());
    out.push(render_table(
        &["Property", "Value"],
        &[
            vec!["Mode".to_string(), report.mode.to_string()],
            vec!["Total Nodes".to_string(), report.total_nodes.to_string()],
            vec!["Healthy Nodes".to_string(), report.healthy_nodes.to_string()],
            vec!["Unhealthy Nodes".to_string(), report.unhealthy_nodes.to_string()],
        ],
    ));
    out.push(String::new());

    if detailed {
        out.push("🖥️  Node Details:".green().to_string());
        let rows: Vec<Vec<String>> = report
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                vec![
                    (i + 1).to_string(),
                    format!("{}:{}", node.host, node.port),
                    format!("{} {}", status_icon(node.status), capitalize(node.status.as_str())),
                    node.last_check
                        .as_ref()
                        .map(format_datetime)
                        .unwrap_or_else(|| "Never".to_string()),
                    node.error.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        out.push(render_table(
            &["#", "Node", "Status", "Last Check", "Error"],
            &rows,
        ));
    } else {
        out.push("🖥️  Node Summary:".green().to_string());
        for (i, node) in report.nodes.iter().enumerate() {
            out.push(format!(
                "  {} Node {}: {}:{} ({})",
                status_icon(node.status),
                i + 1,
                node.host,
                node.port,
                node.status
            ));
        }
    }

    out.push(String::new());
    out.push(verdict(report));
    out.join("\n")
}

fn verdict(report: &ClusterStatusReport) -> String {
    if report.is_fully_healthy() {
        "🎉 All nodes are healthy!".green().to_string()
    } else if report.is_operational() {
        "⚠️  Some nodes are unhealthy, but cluster is operational"
            .yellow()
            .to_string()
    } else {
        "💥 All nodes are unhealthy!".red().to_string()
    }
}
