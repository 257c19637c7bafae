//! Job tracking and submission endpoints

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::info;
use verdict_core::domain::status::JobStatus;
use verdict_core::dto::policy::UploadResponse;

use crate::error::{ClientError, Result};
use crate::paths::{PathTemplate, validate_job_id};
use crate::{AuditClient, JsonTransport};

impl AuditClient {
    // =============================================================================
    // Job Tracking
    // =============================================================================

    /// Get the status of a job from one status path
    ///
    /// # Arguments
    /// * `job_id` - The opaque job id returned by the upload
    /// * `path` - Which status path template to query
    pub async fn get_status(&self, job_id: &str, path: &PathTemplate) -> Result<JobStatus> {
        let payload = self.get_json(&path.render(job_id)?).await?;
        parse_status(job_id, payload)
    }

    /// Get the raw report payload of a job from one report path
    ///
    /// The payload is returned undecoded; its shape varies between engine
    /// versions and is normalized by the caller.
    pub async fn get_report(&self, job_id: &str, path: &PathTemplate) -> Result<Value> {
        self.get_json(&path.render(job_id)?).await
    }

    /// Download the source document of a job
    pub async fn download_pdf(&self, job_id: &str) -> Result<Vec<u8>> {
        validate_job_id(job_id)?;
        let url = self.url(&format!("/{}/pdf", job_id));
        let response = self.send(self.client.get(&url)).await?;

        self.handle_bytes(response).await
    }

    // =============================================================================
    // Job Submission
    // =============================================================================

    /// Upload a policy document and start an audit
    ///
    /// # Arguments
    /// * `file_name` - Name reported for the uploaded file
    /// * `contents` - The document bytes
    /// * `framework` - Regulatory framework to audit against (e.g., "dpdp-2023")
    ///
    /// # Returns
    /// The upload response; its `policy_id` is the job id to poll
    pub async fn upload_policy(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        framework: Option<&str>,
    ) -> Result<UploadResponse> {
        if contents.is_empty() {
            return Err(ClientError::InvalidRequest(format!(
                "refusing to upload empty file '{}'",
                file_name
            )));
        }

        let size = contents.len();
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let mut form = Form::new().part("file", part);
        if let Some(framework) = framework {
            form = form.text("framework", framework.to_string());
        }

        info!(file = file_name, bytes = size, "Uploading policy document");

        let url = self.url("/upload");
        let response = self.send(self.client.post(&url).multipart(form)).await?;

        self.handle_response(response).await
    }
}

/// Decodes a status payload, filling in the job id when the engine omits it
pub fn parse_status(job_id: &str, payload: Value) -> Result<JobStatus> {
    JobStatus::from_payload(job_id, payload)
        .map_err(|e| ClientError::ParseError(format!("Invalid status payload: {}", e)))
}

fn mime_for(file_name: &str) -> &'static str {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if lower.ends_with(".txt") {
        "text/plain"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_status_fills_job_id() {
        let status = parse_status("p-1", json!({"status": "ANALYZING", "progress": 0.5})).unwrap();
        assert_eq!(status.job_id, "p-1");
        assert_eq!(status.progress_percent(), 50);
    }

    #[test]
    fn test_parse_status_keeps_engine_job_id() {
        let status = parse_status("p-1", json!({"policy_id": "p-1-b", "status": "DONE"})).unwrap();
        assert_eq!(status.job_id, "p-1-b");
    }

    #[test]
    fn test_parse_status_rejects_bare_string() {
        let err = parse_status("p-1", json!("PENDING")).unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("Privacy.PDF"), "application/pdf");
        assert_eq!(mime_for("notes.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let client = AuditClient::new("http://localhost:8000/api/v1");
        let err = client
            .upload_policy("empty.pdf", Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
