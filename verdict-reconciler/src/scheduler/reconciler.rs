//! Job reconciler
//!
//! Drives one [`Reconciliation`] on its own task: poll, apply, sleep, and
//! repeat until the job is terminal, then settle and fetch the report once.
//! Only one request is ever in flight because the next poll is scheduled
//! after the previous result has been applied.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info};
use uuid::Uuid;
use verdict_client::AuditClient;

use crate::config::ReconcilerConfig;
use crate::repository::{
    HttpReportRepository, HttpStatusRepository, ReportRepository, StatusRepository,
};
use crate::state::{PollStep, ReconcileOutcome, ReconcilerSnapshot, Reconciliation};

/// Reconciler for a single job, ready to be started
pub struct JobReconciler {
    job_id: String,
    config: ReconcilerConfig,
    statuses: Arc<dyn StatusRepository>,
    reports: Arc<dyn ReportRepository>,
}

impl JobReconciler {
    /// Creates a reconciler over arbitrary status and report sources
    pub fn new(
        job_id: impl Into<String>,
        config: ReconcilerConfig,
        statuses: Arc<dyn StatusRepository>,
        reports: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            config,
            statuses,
            reports,
        }
    }

    /// Creates a reconciler that talks to the engine through `client`
    ///
    /// Status and report paths are taken from the configuration.
    pub fn over_http(
        job_id: impl Into<String>,
        config: ReconcilerConfig,
        client: Arc<AuditClient>,
    ) -> Self {
        let statuses = Arc::new(HttpStatusRepository::new(
            client.clone(),
            config.status_paths.clone(),
        ));
        let reports = Arc::new(HttpReportRepository::new(
            client,
            config.report_paths.clone(),
        ));
        Self::new(job_id, config, statuses, reports)
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Spawns the reconciliation task
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> ReconcilerHandle {
        let run_id = Uuid::new_v4();
        let job_id = self.job_id.clone();
        let machine = Reconciliation::new(job_id.clone(), run_id, self.config.policy.clone());

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot().clone());

        let task = tokio::spawn(self.run(machine, cancel_rx, snapshot_tx));

        ReconcilerHandle {
            job_id,
            run_id,
            cancel: cancel_tx,
            snapshots: snapshot_rx,
            task,
        }
    }

    async fn run(
        self,
        mut machine: Reconciliation,
        mut cancel: watch::Receiver<bool>,
        updates: watch::Sender<ReconcilerSnapshot>,
    ) -> ReconcileOutcome {
        let run_id = machine.snapshot().run_id;
        info!(
            "Starting reconciliation of job {} (run {}, interval: {:?})",
            self.job_id, run_id, self.config.poll_interval
        );

        loop {
            debug!("Polling status of job {}", self.job_id);

            let fetched = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return self.cancelled_outcome(),
                result = self.statuses.fetch_status(&self.job_id) => result,
            };

            // A response that raced with cancel() is dropped unapplied
            if is_cancelled(&cancel) {
                return self.cancelled_outcome();
            }

            let step = match fetched {
                Ok(status) => machine.observe(status),
                Err(e) => {
                    machine.record_poll_failure(&e);
                    PollStep::Continue
                }
            };
            updates.send_replace(machine.snapshot().clone());

            match step {
                PollStep::Continue => {}
                PollStep::FetchReport => break,
                PollStep::Stop => return machine.outcome(),
            }

            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => return self.cancelled_outcome(),
                _ = time::sleep(self.config.poll_interval) => {}
            }
        }

        debug!(
            "Waiting {:?} before fetching report for job {}",
            self.config.settle_delay, self.job_id
        );
        tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => return self.cancelled_outcome(),
            _ = time::sleep(self.config.settle_delay) => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => return self.cancelled_outcome(),
            result = self.reports.fetch_report(&self.job_id) => result,
        };

        if is_cancelled(&cancel) {
            return self.cancelled_outcome();
        }

        machine.report_fetched(result);
        updates.send_replace(machine.snapshot().clone());

        info!(
            "Reconciliation of job {} finished in state {}",
            self.job_id,
            machine.state()
        );
        machine.outcome()
    }

    fn cancelled_outcome(&self) -> ReconcileOutcome {
        info!("Reconciliation of job {} cancelled", self.job_id);
        ReconcileOutcome::Cancelled
    }
}

/// Resolves once cancellation was requested or the handle was dropped
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let _ = cancel.wait_for(|requested| *requested).await;
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow() || cancel.has_changed().is_err()
}

/// Handle to a running reconciliation
///
/// Dropping the handle cancels the run.
#[derive(Debug)]
pub struct ReconcilerHandle {
    job_id: String,
    run_id: Uuid,
    cancel: watch::Sender<bool>,
    snapshots: watch::Receiver<ReconcilerSnapshot>,
    task: JoinHandle<ReconcileOutcome>,
}

impl ReconcilerHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Requests cancellation
    ///
    /// Safe to call any number of times and in any state. Pending timers are
    /// abandoned and an in-flight fetch's result is discarded.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Returns true once the task has ended, for any reason
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> ReconcilerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every applied poll and on the report result
    pub fn subscribe(&self) -> watch::Receiver<ReconcilerSnapshot> {
        self.snapshots.clone()
    }

    /// Waits for the run to end
    pub async fn join(self) -> ReconcileOutcome {
        let Self {
            job_id,
            cancel,
            task,
            ..
        } = self;

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => ReconcileOutcome::Cancelled,
            Err(e) => {
                error!("Reconciliation task for job {} panicked: {}", job_id, e);
                ReconcileOutcome::Aborted {
                    reason: e.to_string(),
                }
            }
        };

        drop(cancel);
        outcome
    }
}
