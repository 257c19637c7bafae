//! Admin command handlers
//!
//! Listings that require an administrator token.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use verdict_client::AuditClient;
use verdict_core::dto::admin::{AuditLogRecord, UserRecord};

use crate::config::Config;

/// Admin subcommands
#[derive(Subcommand)]
pub enum AdminCommands {
    /// List registered users
    Users,
    /// Show the engine's audit trail
    Logs,
}

/// Handle admin commands
pub async fn handle_admin_command(command: AdminCommands, config: &Config) -> Result<()> {
    if config.token.is_none() {
        println!(
            "{}",
            "⚠ No token set; admin endpoints usually require VERDICT_TOKEN".yellow()
        );
    }

    let client = config.client();

    match command {
        AdminCommands::Users => list_users(&client).await,
        AdminCommands::Logs => list_audit_logs(&client).await,
    }
}

async fn list_users(client: &AuditClient) -> Result<()> {
    let users = client.list_users().await.context("Failed to list users")?;

    if users.is_empty() {
        println!("{}", "No users found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} user(s):", users.len()).bold());
    println!();
    for user in users {
        print_user(&user);
    }

    Ok(())
}

async fn list_audit_logs(client: &AuditClient) -> Result<()> {
    let logs = client
        .list_audit_logs()
        .await
        .context("Failed to fetch audit logs")?;

    if logs.is_empty() {
        println!("{}", "No audit log entries.".yellow());
        return Ok(());
    }

    println!("{}", "─".repeat(80).dimmed());
    for record in logs {
        print_audit_record(&record);
    }
    println!("{}", "─".repeat(80).dimmed());

    Ok(())
}

fn print_user(user: &UserRecord) {
    let state = if user.is_active {
        "active".green()
    } else {
        "inactive".dimmed()
    };

    println!("  {} {} ({})", "▸".cyan(), user.email.bold(), state);
    if let Some(name) = &user.full_name {
        println!("    Name: {}", name);
    }
    if let Some(role) = &user.role {
        println!("    Role: {}", role);
    }
}

fn print_audit_record(record: &AuditLogRecord) {
    println!(
        "{} {} {} {}",
        record
            .timestamp
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed(),
        record.action.cyan(),
        record.user_id.as_deref().unwrap_or("-"),
        match (&record.resource_type, &record.resource_id) {
            (Some(kind), Some(id)) => format!("{}:{}", kind, id),
            (None, Some(id)) => id.clone(),
            _ => String::new(),
        }
    );
}
