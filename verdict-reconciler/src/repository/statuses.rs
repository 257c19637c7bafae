//! Status repository

use async_trait::async_trait;
use std::sync::Arc;
use verdict_client::{JsonTransport, PathTemplate, try_in_order};
use verdict_core::domain::status::JobStatus;

use crate::error::FetchError;

/// Source of job status snapshots
#[async_trait]
pub trait StatusRepository: Send + Sync {
    /// Fetches the current status of a job
    ///
    /// # Arguments
    /// * `job_id` - The opaque job id
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, FetchError>;
}

/// HTTP implementation of StatusRepository
pub struct HttpStatusRepository {
    transport: Arc<dyn JsonTransport>,
    paths: Vec<PathTemplate>,
}

impl HttpStatusRepository {
    /// Creates a new HTTP status repository
    ///
    /// # Arguments
    /// * `transport` - JSON access to the engine (usually an `AuditClient`)
    /// * `paths` - Status path templates in priority order
    pub fn new(transport: Arc<dyn JsonTransport>, paths: Vec<PathTemplate>) -> Self {
        Self { transport, paths }
    }
}

#[async_trait]
impl StatusRepository for HttpStatusRepository {
    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, FetchError> {
        let status = try_in_order(self.paths.iter(), |path| async move {
            let payload = self.transport.get_json(&path.render(job_id)?).await?;
            let status = JobStatus::from_payload(job_id, payload).map_err(|e| {
                FetchError::Transient(format!("invalid status payload from {}: {}", path, e))
            })?;
            Ok::<_, FetchError>(status)
        })
        .await?;

        Ok(status)
    }
}
