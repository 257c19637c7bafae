//! Reconciler configuration
//!
//! Defines the polling cadence, the settle delay before the report fetch,
//! the status vocabulary used to detect completion, and the ordered path
//! lists tried against the engine.

use std::time::Duration;
use verdict_client::PathTemplate;
use verdict_client::paths::{default_report_paths, default_status_paths};
use verdict_core::domain::classify::CompletionPolicy;

/// Reconciler configuration
///
/// The alias and marker sets are configuration rather than fixed knowledge:
/// the engine has shipped several status vocabularies and may ship more.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Delay between the end of one status poll and the start of the next
    pub poll_interval: Duration,

    /// Wait between detecting completion and fetching the report
    pub settle_delay: Duration,

    /// How status snapshots are classified
    pub policy: CompletionPolicy,

    /// Status paths, tried in order on every poll
    pub status_paths: Vec<PathTemplate>,

    /// Report paths, tried in order once after completion
    pub report_paths: Vec<PathTemplate>,
}

impl ReconcilerConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(1000),
            policy: CompletionPolicy::default(),
            status_paths: default_status_paths(),
            report_paths: default_report_paths(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// All variables are optional; list values are comma-separated.
    /// - VERDICT_POLL_INTERVAL_MS (default: 2000)
    /// - VERDICT_SETTLE_DELAY_MS (default: 1000)
    /// - VERDICT_SUCCESS_ALIASES (default: COMPLETED,SUCCESS,DONE)
    /// - VERDICT_FAILURE_ALIASES (default: FAILED)
    /// - VERDICT_COMPLETION_MARKERS (default: Audit Finalized)
    /// - VERDICT_STATUS_PATHS (default: /{id}/status,/audit/{id}/status)
    /// - VERDICT_REPORT_PATHS (default: /{id}/report,/audit/{id}/report)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::new();

        let poll_interval = lookup("VERDICT_POLL_INTERVAL_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        let settle_delay = lookup("VERDICT_SETTLE_DELAY_MS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_delay);

        let success_aliases = lookup("VERDICT_SUCCESS_ALIASES")
            .map(|s| split_list(&s))
            .unwrap_or_else(|| defaults.policy.success_aliases.clone());

        let failure_aliases = lookup("VERDICT_FAILURE_ALIASES")
            .map(|s| split_list(&s))
            .unwrap_or_else(|| defaults.policy.failure_aliases.clone());

        let completion_markers = lookup("VERDICT_COMPLETION_MARKERS")
            .map(|s| split_list(&s))
            .unwrap_or_else(|| defaults.policy.completion_markers.clone());

        let status_paths = match lookup("VERDICT_STATUS_PATHS") {
            Some(s) => PathTemplate::parse_all(split_list(&s).iter().map(String::as_str))
                .map_err(|e| anyhow::anyhow!("VERDICT_STATUS_PATHS: {}", e))?,
            None => defaults.status_paths,
        };

        let report_paths = match lookup("VERDICT_REPORT_PATHS") {
            Some(s) => PathTemplate::parse_all(split_list(&s).iter().map(String::as_str))
                .map_err(|e| anyhow::anyhow!("VERDICT_REPORT_PATHS: {}", e))?,
            None => defaults.report_paths,
        };

        Ok(Self {
            poll_interval,
            settle_delay,
            policy: CompletionPolicy::new(success_aliases, failure_aliases, completion_markers),
            status_paths,
            report_paths,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_policy(mut self, policy: CompletionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.policy.success_aliases.is_empty() && self.policy.completion_markers.is_empty() {
            anyhow::bail!("at least one success alias or completion marker is required");
        }

        if self.status_paths.is_empty() {
            anyhow::bail!("at least one status path is required");
        }

        if self.report_paths.is_empty() {
            anyhow::bail!("at least one report path is required");
        }

        Ok(())
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
