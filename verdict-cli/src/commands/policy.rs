//! Policy command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use verdict_client::AuditClient;
use verdict_core::dto::policy::PolicySummary;

use crate::config::Config;

/// Policy subcommands
#[derive(Subcommand)]
pub enum PolicyCommands {
    /// List submitted policies
    List,
}

/// Handle policy commands
pub async fn handle_policy_command(command: PolicyCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        PolicyCommands::List => list_policies(&client).await,
    }
}

/// List submitted policies
async fn list_policies(client: &AuditClient) -> Result<()> {
    let policies = client
        .list_policies()
        .await
        .context("Failed to list policies")?;

    if policies.is_empty() {
        println!("{}", "No policies found.".yellow());
    } else {
        println!("{}", format!("Found {} policy(ies):", policies.len()).bold());
        println!();
        for policy in policies {
            print_policy_summary(&policy);
        }
    }

    Ok(())
}

fn print_policy_summary(policy: &PolicySummary) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        policy.filename.as_deref().unwrap_or("(unnamed)").bold(),
        policy.policy_id.dimmed()
    );
    if let Some(framework) = &policy.framework {
        println!("    Framework: {}", framework);
    }
    if let Some(status) = &policy.status {
        println!("    Status:    {}", status);
    }
    if let Some(score) = policy.score {
        println!("    Score:     {:.1}", score);
    }
    if let Some(created) = policy.created_at {
        println!(
            "    Created:   {}",
            created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
    }
    println!();
}
