//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod admin;
mod auth;
mod job;
mod policy;

pub use admin::AdminCommands;
pub use policy::PolicyCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Exchange credentials for a bearer token
    Login {
        /// Account email
        username: String,

        /// Account password
        #[arg(long, env = "VERDICT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Upload a policy document and start an audit
    Upload {
        /// Path to the policy document (PDF, DOCX or TXT)
        file: PathBuf,

        /// Regulatory framework to audit against
        #[arg(long)]
        framework: Option<String>,

        /// Follow the audit until its report is available
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the current status of an audit job
    Status {
        /// Job id
        id: String,
    },
    /// Show the report of a finished audit job
    Report {
        /// Job id
        id: String,

        /// Print the normalized report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow an audit job until it finishes
    Watch {
        /// Job id
        id: String,

        #[command(flatten)]
        timing: job::WatchTiming,
    },
    /// Download the source document of an audit job
    Pdf {
        /// Job id
        id: String,

        /// Output file (default: <id>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Policy management
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
    /// Administration
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login { username, password } => {
            auth::handle_login(config, &username, &password).await
        }
        Commands::Upload {
            file,
            framework,
            watch,
        } => job::upload(config, &file, framework.as_deref(), watch).await,
        Commands::Status { id } => job::status(config, &id).await,
        Commands::Report { id, json } => job::report(config, &id, json).await,
        Commands::Watch { id, timing } => job::watch(config, &id, &timing).await,
        Commands::Pdf { id, output } => job::download_pdf(config, &id, output).await,
        Commands::Policy { command } => policy::handle_policy_command(command, config).await,
        Commands::Admin { command } => admin::handle_admin_command(command, config).await,
    }
}
