//! Report repository

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;
use verdict_client::{JsonTransport, PathTemplate, try_in_order};
use verdict_core::domain::normalize::{NormalizedReport, normalize_report};

use crate::error::FetchError;

/// Source of final job reports
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Fetches and normalizes the report of a completed job
    ///
    /// An unrecognized payload is still a successful fetch; it comes back
    /// flagged on the [`NormalizedReport`].
    async fn fetch_report(&self, job_id: &str) -> Result<NormalizedReport, FetchError>;
}

/// HTTP implementation of ReportRepository
pub struct HttpReportRepository {
    transport: Arc<dyn JsonTransport>,
    paths: Vec<PathTemplate>,
}

impl HttpReportRepository {
    /// Creates a new HTTP report repository
    ///
    /// # Arguments
    /// * `transport` - JSON access to the engine (usually an `AuditClient`)
    /// * `paths` - Report path templates in priority order
    pub fn new(transport: Arc<dyn JsonTransport>, paths: Vec<PathTemplate>) -> Self {
        Self { transport, paths }
    }
}

#[async_trait]
impl ReportRepository for HttpReportRepository {
    async fn fetch_report(&self, job_id: &str) -> Result<NormalizedReport, FetchError> {
        let report = try_in_order(self.paths.iter(), |path| async move {
            let payload = self.transport.get_json(&path.render(job_id)?).await?;
            if payload.is_null() {
                return Err(FetchError::NotReady(format!("empty report body from {}", path)));
            }
            Ok(normalize(job_id, payload))
        })
        .await?;

        Ok(report)
    }
}

fn normalize(job_id: &str, payload: Value) -> NormalizedReport {
    let report = normalize_report(payload);
    if !report.is_recognized() {
        warn!("Report for job {} has an unrecognized shape, passing it through", job_id);
    }
    report
}
