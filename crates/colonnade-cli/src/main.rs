//! Colonnade - cluster access for column-store nodes
//!
//! Inspect cluster health and run statements through a configured cluster
//! connection.

mod commands;
mod utils;

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use colonnade_cluster::ClusterError;
use colonnade_core::config::LoggingConfig;
use colonnade_core::ColonnadeConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::commands::{parse_param, CommandContext};

#[derive(Parser)]
#[command(name = "colonnade")]
#[command(author = "Colonnade Team")]
#[command(version = colonnade_core::VERSION)]
#[command(about = "Health-aware access to column-store clusters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "COLONNADE_CONFIG")]
    config: Option<String>,

    /// Connection to use (defaults to the configured default)
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Show error codes and context on failure
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check cluster status
    Status {
        /// Show detailed node information
        #[arg(long)]
        detailed: bool,
    },

    /// Check that the cluster answers a trivial query
    Ping,

    /// Run a read query and print its rows
    Query {
        /// SQL statement
        sql: String,

        /// Bound parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,
    },

    /// Run a statement that modifies data
    Exec {
        /// SQL statement
        sql: String,

        /// Bound parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, serde_json::Value)>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let verbose = cli.verbose;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, verbose);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ColonnadeConfig::from_file(path)?,
        None => ColonnadeConfig::from_env()?,
    };

    init_logging(&config.logging, cli.log_level.as_deref());

    let ctx = CommandContext {
        config,
        connection: cli.connection,
        output_format: cli.output,
    };

    match cli.command {
        Commands::Status { detailed } => commands::status::execute(&ctx, detailed).await,
        Commands::Ping => commands::ping::execute(&ctx).await,
        Commands::Query { sql, params } => commands::query::execute(&ctx, &sql, params).await,
        Commands::Exec { sql, params } => commands::exec::execute(&ctx, &sql, params).await,
    }
}

fn init_logging(logging: &LoggingConfig, level: Option<&str>) {
    let level = level.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr, stdout carries command output
    if logging.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn report_error(error: &anyhow::Error, verbose: bool) {
    match error.downcast_ref::<ClusterError>() {
        Some(cluster_error) => {
            eprintln!(
                "{} Cluster Error ({}): {}",
                "❌".red(),
                cluster_error.error_type(),
                cluster_error.to_string().red()
            );
            if verbose {
                eprintln!("Error Code: {}", cluster_error.code());
                eprintln!("Context: {}", cluster_error.context());
            }
        }
        None => {
            eprintln!("{} {}", "❌".red(), error.to_string().red());
            if verbose {
                if let Some(core_error) = error.downcast_ref::<colonnade_core::Error>() {
                    eprintln!("Error Code: {}", core_error.code());
                }
            }
        }
    }
}
