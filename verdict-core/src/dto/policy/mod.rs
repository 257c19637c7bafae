//! Policy DTOs for job submission and listing

use serde::{Deserialize, Serialize};

/// Response to a multipart policy upload
///
/// `policy_id` doubles as the job id polled by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub policy_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Entry in the `/policies/` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    #[serde(alias = "id")]
    pub policy_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub framework: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_response_without_filename() {
        let resp: UploadResponse = serde_json::from_value(json!({"policy_id": "p-123"})).unwrap();
        assert_eq!(resp.policy_id, "p-123");
        assert!(resp.filename.is_none());
    }

    #[test]
    fn test_policy_summary_accepts_id_alias() {
        let summary: PolicySummary = serde_json::from_value(json!({
            "id": "p-9",
            "framework": "dpdp-2023",
            "created_at": "2026-01-30T13:42:00Z",
            "unexpected": true
        }))
        .unwrap();
        assert_eq!(summary.policy_id, "p-9");
        assert_eq!(summary.framework.as_deref(), Some("dpdp-2023"));
        assert!(summary.created_at.is_some());
    }
}
