//! ping command - run a trivial query through the cluster

use anyhow::{bail, Result};
use colored::Colorize;
use serde::Serialize;

use super::CommandContext;

#[derive(Serialize)]
struct PingResult<'a> {
    connection: &'a str,
    ok: bool,
}

pub async fn execute(ctx: &CommandContext) -> Result<()> {
    let client = ctx.client()?;
    let ok = client.test_connection().await;
    let connection = ctx.connection_name();

    if ctx.is_json() {
        println!(
            "{}",
            serde_json::to_string_pretty(&PingResult { connection, ok })?
        );
    } else if ok {
        println!("{} Connection '{}' is reachable", "✅".green(), connection);
    }

    if !ok {
        bail!("Connection '{}' did not answer", connection);
    }

    Ok(())
}
