//! Verdict CLI
//!
//! Command-line interface for submitting policies to the audit engine and
//! following them through to a compliance report.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdict_client::DEFAULT_BASE_URL;

#[derive(Parser)]
#[command(name = "verdict")]
#[command(about = "Policy compliance audit CLI", long_about = None)]
struct Cli {
    /// Audit engine API base URL
    #[arg(long, env = "VERDICT_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Bearer token (see `verdict login`)
    #[arg(long, env = "VERDICT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verdict_cli=info,verdict_reconciler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        token: cli.token,
    };

    handle_command(cli.command, &config).await
}
