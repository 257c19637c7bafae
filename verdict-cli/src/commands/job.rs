//! Job command handlers
//!
//! Handles submitting policies and following audit jobs: status, report,
//! live watching and source download.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use verdict_client::{ClientError, FallbackError, try_in_order};
use verdict_core::domain::normalize::{NormalizedReport, normalize_report};
use verdict_core::domain::report::{JobReport, Verdict};
use verdict_core::domain::status::{LogEntry, StatusClass};
use verdict_reconciler::{JobReconciler, ReconcileOutcome, ReconcilerConfig, ReconcilerSnapshot};

use crate::config::Config;

/// Timing overrides for `watch`
#[derive(Args, Debug, Clone, Default)]
pub struct WatchTiming {
    /// Delay between status polls in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Wait before fetching the report in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,
}

/// Upload a policy document, optionally following the audit
pub async fn upload(
    config: &Config,
    file: &Path,
    framework: Option<&str>,
    watch_job: bool,
) -> Result<()> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Invalid file path: {}", file.display()))?;
    let contents = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let client = config.client();
    let response = client
        .upload_policy(file_name, contents, framework)
        .await
        .context("Upload failed")?;

    println!("{} Uploaded {}", "✓".green(), file_name.bold());
    println!("  Job ID: {}", response.policy_id.cyan());

    if watch_job {
        println!();
        watch(config, &response.policy_id, &WatchTiming::default()).await?;
    }

    Ok(())
}

/// Show the current status of a job
pub async fn status(config: &Config, id: &str) -> Result<()> {
    let reconciler_config = load_reconciler_config(&WatchTiming::default())?;
    let client = config.client();

    let status = try_in_order(&reconciler_config.status_paths, |path| {
        client.get_status(id, path)
    })
    .await
    .map_err(|e| lookup_failed("fetch status of", id, e))?;
    let class = reconciler_config.policy.classify(&status);

    println!("{}", "Job Status:".bold());
    println!("  ID:       {}", status.job_id.cyan());
    println!(
        "  Status:   {} ({})",
        status.raw_status,
        colorize_class(class)
    );
    println!("  Progress: {}", progress_bar(status.progress_percent()));

    if !status.log_entries.is_empty() {
        println!("\n{}", "Agent Trace:".bold());
        for entry in &status.log_entries {
            print_log_entry(entry);
        }
    }

    Ok(())
}

/// Fetch and display the report of a finished job
pub async fn report(config: &Config, id: &str, as_json: bool) -> Result<()> {
    let reconciler_config = load_reconciler_config(&WatchTiming::default())?;
    let client = config.client();

    let payload = try_in_order(&reconciler_config.report_paths, |path| {
        client.get_report(id, path)
    })
    .await
    .map_err(|e| lookup_failed("fetch report of", id, e))?;
    let report = normalize_report(payload);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report.payload)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Follow a job until it reaches a terminal state
///
/// Ctrl-C cancels the reconciliation and exits cleanly.
pub async fn watch(config: &Config, id: &str, timing: &WatchTiming) -> Result<()> {
    let reconciler_config = load_reconciler_config(timing)?;
    let handle =
        JobReconciler::over_http(id, reconciler_config, Arc::new(config.client())).start();
    debug!("Watching job {} (run {})", id, handle.run_id());

    println!("{}", format!("Watching job {}", id).bold());
    println!("{}", "─".repeat(80).dimmed());

    let mut updates = handle.subscribe();
    let mut printed = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                printed = print_progress(&snapshot, printed);
                if snapshot.state.is_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                println!("{}", "Cancelling...".yellow());
                handle.cancel();
                break;
            }
        }
    }

    let outcome = handle.join().await;
    println!("{}", "─".repeat(80).dimmed());

    match outcome {
        ReconcileOutcome::Completed { report } => {
            println!("{} Audit completed", "✓".green());
            println!();
            print_report(&report);
            Ok(())
        }
        ReconcileOutcome::ReportUnavailable { error } => {
            anyhow::bail!("Audit completed but the report is unavailable: {}", error)
        }
        ReconcileOutcome::Failed { raw_status } => {
            anyhow::bail!("Audit failed (status {})", raw_status)
        }
        ReconcileOutcome::Cancelled => {
            println!("{}", "Watch cancelled.".dimmed());
            Ok(())
        }
        ReconcileOutcome::Aborted { reason } => anyhow::bail!("Watch aborted: {}", reason),
    }
}

/// Download the source document of a job
pub async fn download_pdf(config: &Config, id: &str, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", id)));
    let bytes = config
        .client()
        .download_pdf(id)
        .await
        .with_context(|| format!("Failed to download document of job {}", id))?;

    tokio::fs::write(&output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Saved {} bytes to {}",
        "✓".green(),
        bytes.len(),
        output.display().to_string().cyan()
    );

    Ok(())
}

/// Summarizes one failed attempt per path, pointing at `login` on a 401
fn lookup_failed(action: &str, id: &str, error: FallbackError<ClientError>) -> anyhow::Error {
    let errors = error.into_errors();
    if errors.iter().any(ClientError::is_unauthorized) {
        return anyhow::anyhow!(
            "Not authorized to {} job {}: run `verdict login` and export VERDICT_TOKEN",
            action,
            id
        );
    }

    let details = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    anyhow::anyhow!("Failed to {} job {}: {}", action, id, details)
}

fn load_reconciler_config(timing: &WatchTiming) -> Result<ReconcilerConfig> {
    let mut config =
        ReconcilerConfig::from_env().context("Invalid reconciler configuration")?;
    if let Some(ms) = timing.interval_ms {
        config = config.with_poll_interval(Duration::from_millis(ms));
    }
    if let Some(ms) = timing.settle_ms {
        config = config.with_settle_delay(Duration::from_millis(ms));
    }
    config.validate()?;
    Ok(config)
}

/// Prints log lines not yet shown and the current progress
///
/// Returns the number of log lines shown so far. The engine resends the full
/// trace on every poll; when it comes back shorter the trace is printed anew.
fn print_progress(snapshot: &ReconcilerSnapshot, printed: usize) -> usize {
    let start = if snapshot.logs.len() < printed {
        0
    } else {
        printed
    };

    for entry in &snapshot.logs[start..] {
        print_log_entry(entry);
    }

    if let Some(raw_status) = &snapshot.raw_status {
        println!(
            "{} {} {}",
            progress_bar(snapshot.progress_percent),
            raw_status.bold(),
            format!("[{}]", snapshot.state).dimmed()
        );
    } else if snapshot.failed_polls > 0 {
        println!(
            "{}",
            format!("Engine unreachable ({} failed polls)", snapshot.failed_polls).yellow()
        );
    }

    snapshot.logs.len()
}

fn print_report(report: &NormalizedReport) {
    if !report.is_recognized() {
        println!(
            "{}",
            "⚠ Report has an unrecognized shape, showing it as received".yellow()
        );
        if let Ok(pretty) = serde_json::to_string_pretty(&report.payload) {
            println!("{}", pretty);
        }
        return;
    }

    match report.to_report() {
        Ok(typed) => print_typed_report(&typed),
        Err(e) => {
            println!("{}", format!("⚠ Could not read report: {}", e).yellow());
            if let Ok(pretty) = serde_json::to_string_pretty(&report.payload) {
                println!("{}", pretty);
            }
        }
    }
}

fn print_typed_report(report: &JobReport) {
    println!("{}", "Compliance Report:".bold());
    if !report.job_id.is_empty() {
        println!("  Job ID:   {}", report.job_id.cyan());
    }
    if let Some(filename) = &report.filename {
        println!("  File:     {}", filename);
    }
    if let Some(verdict) = report.overall_verdict {
        println!("  Verdict:  {}", colorize_verdict(verdict));
    }
    if let Some(score) = report.score {
        println!("  Score:    {:.1}", score);
    }

    if report.requirements.is_empty() {
        println!("\n{}", "No requirements evaluated.".yellow());
        return;
    }

    println!(
        "\n{}",
        format!("Requirements ({}):", report.requirements.len()).bold()
    );
    for requirement in &report.requirements {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            requirement.requirement_id.bold(),
            colorize_requirement(&requirement.status)
        );
        if let Some(title) = &requirement.title {
            println!("    {}", title);
        }
        if !requirement.reasoning.is_empty() {
            println!("    {}", requirement.reasoning.dimmed());
        }
        if let Some(remediation) = &requirement.remediation {
            println!("    Fix: {}", remediation);
        }
    }
}

fn print_log_entry(entry: &LogEntry) {
    let agent = if entry.agent.is_empty() {
        "engine"
    } else {
        entry.agent.as_str()
    };
    println!("{} {}", format!("[{}]", agent).cyan(), entry.message);
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) / 5;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(20 - filled),
        percent
    )
}

fn colorize_class(class: StatusClass) -> ColoredString {
    let label = class.to_string();
    match class {
        StatusClass::InProgress => label.cyan(),
        StatusClass::Completed => label.green(),
        StatusClass::Failed => label.red(),
    }
}

fn colorize_verdict(verdict: Verdict) -> ColoredString {
    let label = verdict.to_string();
    match verdict {
        Verdict::Green => label.green(),
        Verdict::Yellow => label.yellow(),
        Verdict::Red => label.red(),
    }
}

fn colorize_requirement(status: &str) -> ColoredString {
    match status.to_ascii_uppercase().as_str() {
        "COVERED" | "COMPLIANT" => status.green(),
        "PARTIAL" | "PARTIALLY_COVERED" => status.yellow(),
        _ => status.red(),
    }
}
