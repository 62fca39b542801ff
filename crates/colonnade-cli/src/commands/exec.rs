//! exec command - run a statement that modifies data

use anyhow::Result;
use colored::Colorize;
use serde_json::{json, Value};

use super::{query_params, CommandContext};

pub async fn execute(ctx: &CommandContext, sql: &str, params: Vec<(String, Value)>) -> Result<()> {
    let client = ctx.client()?;
    let ack = client.write(sql, &query_params(params)).await?;

    if ctx.is_json() {
        // The summary header is itself JSON when the server sends one
        let summary = ack
            .summary
            .as_deref()
            .map(|s| serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string())));
        println!("{}", serde_json::to_string_pretty(&json!({ "ok": true, "summary": summary }))?);
    } else {
        println!("{} Statement executed", "✅".green());
        if let Some(summary) = ack.summary {
            println!("Summary: {}", summary);
        }
    }

    Ok(())
}
