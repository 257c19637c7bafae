//! Login command handler

use anyhow::{Context, Result};
use colored::*;
use verdict_client::AuditClient;

use crate::config::Config;

pub async fn handle_login(config: &Config, username: &str, password: &str) -> Result<()> {
    let client = AuditClient::new(&config.api_url);

    let token = client
        .login(username, password)
        .await
        .context("Login failed")?;

    println!("{} Logged in as {}", "✓".green(), username.cyan());
    println!();
    println!("{}", "Export the token to use it in later commands:".dimmed());
    println!("  export VERDICT_TOKEN={}", token.access_token);

    Ok(())
}
