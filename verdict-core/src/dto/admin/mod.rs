//! Admin listing DTOs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Immutable audit-trail entry recorded by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub log_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub action: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audit_log_record() {
        let record: AuditLogRecord = serde_json::from_value(json!({
            "log_id": "l1",
            "timestamp": "2026-02-01T09:30:00Z",
            "user_id": "admin@policy.ai",
            "action": "POLICY_UPLOAD",
            "resource_type": "POLICY",
            "resource_id": "p123",
            "ip_address": "192.168.1.1"
        }))
        .unwrap();
        assert_eq!(record.action, "POLICY_UPLOAD");
        assert_eq!(record.resource_id.as_deref(), Some("p123"));
    }
}
