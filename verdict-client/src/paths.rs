//! Resource path templates
//!
//! The engine has exposed the same job resources under more than one path,
//! so callers work with ordered lists of templates instead of fixed URLs.

use std::fmt;
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// Placeholder replaced by the job id
pub const ID_PLACEHOLDER: &str = "{id}";

/// Status paths, in the order they are tried
pub const DEFAULT_STATUS_PATHS: &[&str] = &["/{id}/status", "/audit/{id}/status"];

/// Report paths, in the order they are tried
pub const DEFAULT_REPORT_PATHS: &[&str] = &["/{id}/report", "/audit/{id}/report"];

/// Path relative to the API base with an `{id}` placeholder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathTemplate(String);

impl PathTemplate {
    /// Parses a template, requiring a leading `/` and an `{id}` placeholder
    pub fn parse(template: &str) -> Result<Self> {
        let template = template.trim();
        if !template.starts_with('/') {
            return Err(ClientError::InvalidRequest(format!(
                "path template '{}' must start with '/'",
                template
            )));
        }
        if !template.contains(ID_PLACEHOLDER) {
            return Err(ClientError::InvalidRequest(format!(
                "path template '{}' has no {} placeholder",
                template, ID_PLACEHOLDER
            )));
        }
        Ok(Self(template.to_string()))
    }

    /// Parses a list of templates, keeping their order
    pub fn parse_all<'a>(templates: impl IntoIterator<Item = &'a str>) -> Result<Vec<Self>> {
        templates.into_iter().map(Self::parse).collect()
    }

    /// Substitutes the job id into the template
    pub fn render(&self, job_id: &str) -> Result<String> {
        validate_job_id(job_id)?;
        Ok(self.0.replace(ID_PLACEHOLDER, job_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Rejects ids that would escape their path segment
pub fn validate_job_id(job_id: &str) -> Result<()> {
    if job_id.is_empty() {
        return Err(ClientError::InvalidRequest("job id is empty".to_string()));
    }
    if job_id
        .chars()
        .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control())
    {
        return Err(ClientError::InvalidRequest(format!(
            "job id '{}' contains characters not allowed in a path segment",
            job_id
        )));
    }
    Ok(())
}

impl FromStr for PathTemplate {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Default status path templates
pub fn default_status_paths() -> Vec<PathTemplate> {
    DEFAULT_STATUS_PATHS
        .iter()
        .map(|p| PathTemplate(p.to_string()))
        .collect()
}

/// Default report path templates
pub fn default_report_paths() -> Vec<PathTemplate> {
    DEFAULT_REPORT_PATHS
        .iter()
        .map(|p| PathTemplate(p.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let template = PathTemplate::parse("/audit/{id}/status").unwrap();
        assert_eq!(template.render("p-123").unwrap(), "/audit/p-123/status");
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(PathTemplate::parse("{id}/status").is_err());
        assert!(PathTemplate::parse("/status").is_err());
        assert!("/{id}/report".parse::<PathTemplate>().is_ok());
    }

    #[test]
    fn test_render_rejects_unsafe_ids() {
        let template = PathTemplate::parse("/{id}/status").unwrap();
        for id in ["", "../admin", "a b", "a?x=1", "a#b"] {
            assert!(template.render(id).is_err(), "{id:?}");
        }
    }

    #[test]
    fn test_default_orderings() {
        let status: Vec<String> = default_status_paths()
            .iter()
            .map(|p| p.render("j").unwrap())
            .collect();
        assert_eq!(status, vec!["/j/status", "/audit/j/status"]);

        let report = default_report_paths();
        assert_eq!(report[0].as_str(), "/{id}/report");
        assert_eq!(report[1].as_str(), "/audit/{id}/report");
    }
}
