//! Job status domain types

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status token assumed when the engine sends none
pub const DEFAULT_STATUS: &str = "PENDING";

/// Status of an audit job as last reported by the engine
///
/// Every field is read leniently: the engine has been seen to omit or null
/// out `status`, `progress` and `logs` while a job is still being set up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    #[serde(default, alias = "policy_id", deserialize_with = "null_as_default")]
    pub job_id: String,
    #[serde(
        rename = "status",
        default = "default_status",
        deserialize_with = "status_token"
    )]
    pub raw_status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(rename = "logs", default, deserialize_with = "lenient_log_entries")]
    pub log_entries: Vec<LogEntry>,
}

/// One line of the engine's agent trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub agent: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Coarse classification of a status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusClass {
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Creates a status snapshot with no progress and no logs
    pub fn new(job_id: impl Into<String>, raw_status: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            raw_status: raw_status.into(),
            progress: 0.0,
            log_entries: Vec::new(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_log(mut self, agent: impl Into<String>, message: impl Into<String>) -> Self {
        self.log_entries.push(LogEntry {
            agent: agent.into(),
            message: message.into(),
        });
        self
    }

    /// Decodes an engine status payload
    ///
    /// `job_id` is used when the payload does not name the job itself.
    pub fn from_payload(job_id: &str, payload: serde_json::Value) -> serde_json::Result<Self> {
        let mut status: JobStatus = serde_json::from_value(payload)?;
        if status.job_id.is_empty() {
            status.job_id = job_id.to_string();
        }
        Ok(status)
    }

    /// Status token trimmed and upper-cased, `PENDING` when blank
    pub fn normalized_status(&self) -> String {
        let trimmed = self.raw_status.trim();
        if trimmed.is_empty() {
            DEFAULT_STATUS.to_string()
        } else {
            trimmed.to_uppercase()
        }
    }

    /// Progress clamped into `[0.0, 1.0]`
    pub fn clamped_progress(&self) -> f64 {
        clamp_progress(self.progress)
    }

    /// Progress as a whole display percentage in `[0, 100]`
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.progress)
    }
}

/// Clamps a progress fraction into `[0.0, 1.0]`, mapping NaN to zero
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

/// Floors a progress fraction to an integer percentage in `[0, 100]`
pub fn progress_percent(progress: f64) -> u8 {
    (clamp_progress(progress) * 100.0).floor() as u8
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusClass::InProgress => "IN_PROGRESS",
            StatusClass::Completed => "COMPLETED",
            StatusClass::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

fn status_token<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let token = Option::<String>::deserialize(deserializer)?;
    Ok(token
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_status))
}

/// Decodes the agent trace entry by entry
///
/// A malformed line never rejects the snapshot: a bare string becomes a
/// message without an agent, scalar fields are stringified, and anything
/// else in place of a field reads as empty. A non-array trace reads as empty.
fn lenient_log_entries<'de, D>(deserializer: D) -> Result<Vec<LogEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => entries,
        _ => return Ok(Vec::new()),
    };

    Ok(entries.iter().filter_map(log_entry_from_value).collect())
}

fn log_entry_from_value(value: &Value) -> Option<LogEntry> {
    match value {
        Value::Object(fields) => Some(LogEntry {
            agent: fields.get("agent").map(scalar_text).unwrap_or_default(),
            message: fields.get("message").map(scalar_text).unwrap_or_default(),
        }),
        Value::String(message) => Some(LogEntry {
            agent: String::new(),
            message: message.clone(),
        }),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Deserializes `null` as the type's default value
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
