//! Per-job registry of running reconciliations

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use super::reconciler::{JobReconciler, ReconcilerHandle};
use crate::state::ReconcilerSnapshot;

/// Running reconciliations keyed by job id
///
/// At most one run exists per job. Starting a job that is already being
/// reconciled cancels the earlier run.
#[derive(Debug, Default)]
pub struct ReconcilerRegistry {
    handles: Mutex<HashMap<String, ReconcilerHandle>>,
}

impl ReconcilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `reconciler` and returns the id of the new run
    ///
    /// Any earlier run for the same job is cancelled before the new task is
    /// spawned. Finished runs of other jobs are dropped on the way.
    pub fn start(&self, reconciler: JobReconciler) -> Uuid {
        let job_id = reconciler.job_id().to_string();
        let mut handles = self.handles();

        if let Some(previous) = handles.remove(&job_id) {
            previous.cancel();
            info!("Cancelled run {} of job {}", previous.run_id(), job_id);
        }
        handles.retain(|_, handle| !handle.is_finished());

        let handle = reconciler.start();
        let run_id = handle.run_id();
        info!("Registered run {} of job {}", run_id, job_id);
        handles.insert(job_id, handle);

        run_id
    }

    /// Cancels the run for `job_id`; returns false if none is registered
    ///
    /// The handle stays registered so its final snapshot remains readable.
    pub fn cancel(&self, job_id: &str) -> bool {
        match self.handles().get(job_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for handle in self.handles().values() {
            handle.cancel();
        }
    }

    pub fn snapshot(&self, job_id: &str) -> Option<ReconcilerSnapshot> {
        self.handles().get(job_id).map(ReconcilerHandle::snapshot)
    }

    pub fn subscribe(&self, job_id: &str) -> Option<watch::Receiver<ReconcilerSnapshot>> {
        self.handles().get(job_id).map(ReconcilerHandle::subscribe)
    }

    /// Removes and returns the handle for `job_id`, e.g. to join it
    pub fn take(&self, job_id: &str) -> Option<ReconcilerHandle> {
        self.handles().remove(job_id)
    }

    /// Drops handles whose task has ended; returns how many were removed
    pub fn prune_finished(&self) -> usize {
        let mut handles = self.handles();
        let before = handles.len();
        handles.retain(|_, handle| !handle.is_finished());
        before - handles.len()
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles().is_empty()
    }

    fn handles(&self) -> MutexGuard<'_, HashMap<String, ReconcilerHandle>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcilerConfig;
    use crate::state::{ReconcileOutcome, ReconcilerState};
    use crate::testing::{GatedStatusRepository, ScriptedReportRepository, ScriptedStatusRepository};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time;
    use verdict_core::domain::status::JobStatus;

    fn reconciler(
        job_id: &str,
        raw_status: &str,
    ) -> (JobReconciler, Arc<ScriptedStatusRepository>) {
        let statuses = Arc::new(ScriptedStatusRepository::new(vec![Ok(JobStatus::new(
            job_id, raw_status,
        ))]));
        let reports = Arc::new(ScriptedReportRepository::new(vec![Ok(
            serde_json::json!({"requirements": []}),
        )]));
        let reconciler =
            JobReconciler::new(job_id, ReconcilerConfig::default(), statuses.clone(), reports);
        (reconciler, statuses)
    }

    #[tokio::test(start_paused = true)]
    async fn test_restarting_a_job_cancels_the_previous_run() {
        let registry = ReconcilerRegistry::new();

        let (first, first_statuses) = reconciler("p-1", "ANALYZING");
        let first_run = registry.start(first);
        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(first_statuses.calls(), 2);

        let (second, second_statuses) = reconciler("p-1", "ANALYZING");
        let second_run = registry.start(second);
        assert_ne!(first_run, second_run);
        assert_eq!(registry.len(), 1);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(first_statuses.calls(), 2);
        assert!(second_statuses.calls() > 1);
        assert_eq!(registry.snapshot("p-1").unwrap().run_id, second_run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_are_independent() {
        let registry = ReconcilerRegistry::new();
        let (a, _) = reconciler("p-a", "FAILED");
        let (b, b_statuses) = reconciler("p-b", "ANALYZING");
        registry.start(a);
        registry.start(b);

        time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(registry.snapshot("p-a").unwrap().state, ReconcilerState::Failed);
        assert_eq!(registry.snapshot("p-b").unwrap().state, ReconcilerState::Polling);
        assert_eq!(b_statuses.calls(), 3);

        assert_eq!(registry.prune_finished(), 1);
        assert!(registry.snapshot("p-a").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_take() {
        let registry = ReconcilerRegistry::new();
        let (r, _) = reconciler("p-1", "ANALYZING");
        registry.start(r);

        assert!(!registry.cancel("unknown"));
        assert!(registry.cancel("p-1"));
        assert!(registry.cancel("p-1"));

        let handle = registry.take("p-1").unwrap();
        assert!(registry.is_empty());
        assert_eq!(handle.join().await, ReconcileOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_drops_finished_runs() {
        let registry = ReconcilerRegistry::new();
        let (a, _) = reconciler("p-a", "FAILED");
        registry.start(a);
        time::sleep(Duration::from_millis(100)).await;

        let (b, _) = reconciler("p-b", "ANALYZING");
        registry.start(b);
        assert_eq!(registry.len(), 1);
        assert!(registry.snapshot("p-a").is_none());
        assert!(registry.snapshot("p-b").is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_replaced_run_never_applies_its_in_flight_result() {
        let registry = ReconcilerRegistry::new();
        let config = ReconcilerConfig::default()
            .with_poll_interval(Duration::from_millis(10))
            .with_settle_delay(Duration::from_millis(10));

        let old_statuses = Arc::new(GatedStatusRepository::new(JobStatus::new("p-1", "COMPLETED")));
        let old_reports = Arc::new(ScriptedReportRepository::new(vec![Ok(
            serde_json::json!({"requirements": []}),
        )]));
        registry.start(JobReconciler::new(
            "p-1",
            config.clone(),
            old_statuses.clone(),
            old_reports.clone(),
        ));
        let mut old_updates = registry.subscribe("p-1").unwrap();
        old_statuses.wait_until_entered().await;

        let new_statuses = Arc::new(ScriptedStatusRepository::new(vec![Ok(JobStatus::new(
            "p-1",
            "ANALYZING",
        ))]));
        let new_reports = Arc::new(ScriptedReportRepository::new(vec![Ok(
            serde_json::json!({"requirements": []}),
        )]));
        let new_run = registry.start(JobReconciler::new(
            "p-1",
            config,
            new_statuses.clone(),
            new_reports,
        ));
        old_statuses.release();

        // the old task drops its sender once it has exited
        time::timeout(Duration::from_secs(5), async {
            while old_updates.changed().await.is_ok() {}
        })
        .await
        .unwrap();

        let old = old_updates.borrow().clone();
        assert_eq!(old.state, ReconcilerState::Polling);
        assert_eq!(old.polls, 0);
        assert_eq!(old_reports.calls(), 0);

        time::timeout(Duration::from_secs(5), async {
            while new_statuses.calls() == 0 {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert_eq!(registry.snapshot("p-1").unwrap().run_id, new_run);
        registry.cancel_all();
    }
}
