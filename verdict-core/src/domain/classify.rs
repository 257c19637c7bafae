//! Status classification
//!
//! The engine's status field and its log stream have been seen to disagree,
//! so either one is allowed to declare a job complete.

use serde::{Deserialize, Serialize};

use super::status::{JobStatus, StatusClass};

pub const DEFAULT_SUCCESS_ALIASES: &[&str] = &["COMPLETED", "SUCCESS", "DONE"];
pub const DEFAULT_FAILURE_ALIASES: &[&str] = &["FAILED"];
pub const DEFAULT_COMPLETION_MARKERS: &[&str] = &["Audit Finalized"];

/// Rules for turning a raw status snapshot into a [`StatusClass`]
///
/// Alias sets are compared against the trimmed, upper-cased status token.
/// Completion markers are matched as plain substrings of log messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionPolicy {
    pub success_aliases: Vec<String>,
    pub failure_aliases: Vec<String>,
    pub completion_markers: Vec<String>,
}

impl CompletionPolicy {
    pub fn new(
        success_aliases: impl IntoIterator<Item = impl Into<String>>,
        failure_aliases: impl IntoIterator<Item = impl Into<String>>,
        completion_markers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            success_aliases: normalize_aliases(success_aliases),
            failure_aliases: normalize_aliases(failure_aliases),
            completion_markers: completion_markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    /// Classifies a snapshot
    ///
    /// Completion (by alias or by log marker) is checked before failure.
    pub fn classify(&self, status: &JobStatus) -> StatusClass {
        if self.is_completed(status) {
            StatusClass::Completed
        } else if self.is_failed(status) {
            StatusClass::Failed
        } else {
            StatusClass::InProgress
        }
    }

    pub fn is_completed(&self, status: &JobStatus) -> bool {
        let token = status.normalized_status();
        self.success_aliases.iter().any(|alias| *alias == token) || self.has_marker(status)
    }

    pub fn is_failed(&self, status: &JobStatus) -> bool {
        let token = status.normalized_status();
        self.failure_aliases.iter().any(|alias| *alias == token)
    }

    /// Returns true when any log message carries a completion marker
    pub fn has_marker(&self, status: &JobStatus) -> bool {
        status.log_entries.iter().any(|entry| {
            self.completion_markers
                .iter()
                .any(|marker| entry.message.contains(marker.as_str()))
        })
    }
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_SUCCESS_ALIASES.iter().copied(),
            DEFAULT_FAILURE_ALIASES.iter().copied(),
            DEFAULT_COMPLETION_MARKERS.iter().copied(),
        )
    }
}

fn normalize_aliases(aliases: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    aliases
        .into_iter()
        .map(|alias| alias.into().trim().to_uppercase())
        .filter(|alias| !alias.is_empty())
        .collect()
}
