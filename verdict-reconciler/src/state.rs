//! Reconciliation state machine
//!
//! [`Reconciliation`] is the synchronous core of the reconciler: it folds
//! status snapshots and the report result into a [`ReconcilerSnapshot`] and
//! tells the driver what to do next. It performs no I/O and never sleeps.
//!
//! ```text
//! Polling ──in progress──▶ Polling
//! Polling ──completed────▶ CompletedReportPending ──report ok──▶ CompletedReportReady
//!                                                 └─report err─▶ CompletedReportFailed
//! Polling ──failed───────▶ Failed
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use verdict_core::domain::classify::CompletionPolicy;
use verdict_core::domain::normalize::NormalizedReport;
use verdict_core::domain::status::{JobStatus, LogEntry, StatusClass};

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcilerState {
    Polling,
    CompletedReportPending,
    CompletedReportReady,
    CompletedReportFailed,
    Failed,
}

impl ReconcilerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::CompletedReportReady | Self::CompletedReportFailed | Self::Failed
        )
    }
}

impl std::fmt::Display for ReconcilerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Polling => "POLLING",
            Self::CompletedReportPending => "COMPLETED_REPORT_PENDING",
            Self::CompletedReportReady => "COMPLETED_REPORT_READY",
            Self::CompletedReportFailed => "COMPLETED_REPORT_FAILED",
            Self::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Everything the reconciler currently knows about a job
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcilerSnapshot {
    pub job_id: String,
    pub run_id: Uuid,
    pub state: ReconcilerState,
    /// Status token exactly as last received
    pub raw_status: Option<String>,
    pub classification: StatusClass,
    /// Progress clamped into `[0.0, 1.0]`
    pub progress: f64,
    pub progress_percent: u8,
    pub logs: Vec<LogEntry>,
    pub report: Option<NormalizedReport>,
    pub report_error: Option<String>,
    /// Successfully applied polls
    pub polls: u32,
    /// Polls that failed on every status path
    pub failed_polls: u32,
    pub last_polled_at: Option<DateTime<Utc>>,
}

impl ReconcilerSnapshot {
    fn new(job_id: String, run_id: Uuid) -> Self {
        Self {
            job_id,
            run_id,
            state: ReconcilerState::Polling,
            raw_status: None,
            classification: StatusClass::InProgress,
            progress: 0.0,
            progress_percent: 0,
            logs: Vec::new(),
            report: None,
            report_error: None,
            polls: 0,
            failed_polls: 0,
            last_polled_at: None,
        }
    }
}

/// What the driver should do after a status snapshot is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Sleep one interval and poll again
    Continue,
    /// Stop polling, settle, then fetch the report
    FetchReport,
    /// Stop; the job reached a terminal state
    Stop,
}

/// How a reconciliation run ended
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Completed and the report was fetched
    Completed { report: NormalizedReport },
    /// Completed, but the report could not be fetched on any path
    ReportUnavailable { error: String },
    /// The engine reported the job as failed
    Failed { raw_status: String },
    /// Cancelled by the caller before reaching a terminal state
    Cancelled,
    /// The run ended without a result (e.g. its task panicked)
    Aborted { reason: String },
}

/// Synchronous reconciliation state for one job
#[derive(Debug, Clone)]
pub struct Reconciliation {
    policy: CompletionPolicy,
    snapshot: ReconcilerSnapshot,
}

impl Reconciliation {
    pub fn new(job_id: impl Into<String>, run_id: Uuid, policy: CompletionPolicy) -> Self {
        Self {
            policy,
            snapshot: ReconcilerSnapshot::new(job_id.into(), run_id),
        }
    }

    pub fn snapshot(&self) -> &ReconcilerSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> ReconcilerState {
        self.snapshot.state
    }

    /// Applies a status snapshot
    ///
    /// Only has an effect while polling. Once polling has stopped, later
    /// snapshots are ignored and `Stop` is returned.
    pub fn observe(&mut self, status: JobStatus) -> PollStep {
        if self.snapshot.state != ReconcilerState::Polling {
            return PollStep::Stop;
        }

        let class = self.policy.classify(&status);
        let progress = status.clamped_progress();

        let snapshot = &mut self.snapshot;
        snapshot.polls += 1;
        snapshot.last_polled_at = Some(Utc::now());
        snapshot.progress = progress;
        snapshot.progress_percent = status.progress_percent();
        snapshot.logs = status.log_entries;
        snapshot.classification = class;
        snapshot.raw_status = Some(status.raw_status);

        match class {
            StatusClass::InProgress => PollStep::Continue,
            StatusClass::Completed => {
                info!(
                    "Job {} completed (status {:?}), report pending",
                    snapshot.job_id,
                    snapshot.raw_status.as_deref().unwrap_or_default()
                );
                snapshot.state = ReconcilerState::CompletedReportPending;
                PollStep::FetchReport
            }
            StatusClass::Failed => {
                warn!(
                    "Job {} failed upstream (status {:?})",
                    snapshot.job_id,
                    snapshot.raw_status.as_deref().unwrap_or_default()
                );
                snapshot.state = ReconcilerState::Failed;
                PollStep::Stop
            }
        }
    }

    /// Records a poll on which every status path failed
    pub fn record_poll_failure(&mut self, error: &FetchError) {
        if self.snapshot.state != ReconcilerState::Polling {
            return;
        }
        self.snapshot.failed_polls += 1;
        warn!(
            "Status poll for job {} failed ({} so far): {}",
            self.snapshot.job_id, self.snapshot.failed_polls, error
        );
    }

    /// Applies the result of the one report fetch
    ///
    /// Ignored unless the report is pending. The COMPLETED classification is
    /// kept whether or not the fetch succeeded.
    pub fn report_fetched(&mut self, result: Result<NormalizedReport, FetchError>) {
        if self.snapshot.state != ReconcilerState::CompletedReportPending {
            return;
        }

        match result {
            Ok(report) => {
                info!(
                    "Report for job {} ready ({:?})",
                    self.snapshot.job_id, report.shape
                );
                self.snapshot.report = Some(report);
                self.snapshot.state = ReconcilerState::CompletedReportReady;
            }
            Err(e) => {
                warn!("Report for job {} unavailable: {}", self.snapshot.job_id, e);
                self.snapshot.report_error = Some(e.to_string());
                self.snapshot.state = ReconcilerState::CompletedReportFailed;
            }
        }
    }

    /// Outcome for a run that ended in the current state
    pub fn outcome(&self) -> ReconcileOutcome {
        let snapshot = &self.snapshot;
        match snapshot.state {
            ReconcilerState::CompletedReportReady => match &snapshot.report {
                Some(report) => ReconcileOutcome::Completed {
                    report: report.clone(),
                },
                None => ReconcileOutcome::Aborted {
                    reason: "report missing in ready state".to_string(),
                },
            },
            ReconcilerState::CompletedReportFailed => ReconcileOutcome::ReportUnavailable {
                error: snapshot.report_error.clone().unwrap_or_default(),
            },
            ReconcilerState::Failed => ReconcileOutcome::Failed {
                raw_status: snapshot.raw_status.clone().unwrap_or_default(),
            },
            ReconcilerState::Polling | ReconcilerState::CompletedReportPending => {
                ReconcileOutcome::Aborted {
                    reason: format!("run ended in non-terminal state {}", snapshot.state),
                }
            }
        }
    }
}
