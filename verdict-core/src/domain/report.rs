//! Compliance report domain types

use serde::{Deserialize, Deserializer, Serialize};

use super::status::null_as_default;

/// Final compliance report for an audit job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    #[serde(default, alias = "policy_id", alias = "id", deserialize_with = "null_as_default")]
    pub job_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub evaluated_at: Option<String>,
    #[serde(default, alias = "verdict")]
    pub overall_verdict: Option<Verdict>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<RequirementAudit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ragas_faithfulness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ragas_answer_relevancy: Option<f64>,
}

/// Overall verdict of an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Green,
    Yellow,
    Red,
}

/// Evaluation of a single regulatory requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementAudit {
    #[serde(alias = "id")]
    pub requirement_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    pub status: String,
    #[serde(default, alias = "reason", deserialize_with = "null_as_default")]
    pub reasoning: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub evidence: Vec<String>,
    #[serde(default, alias = "pages")]
    pub page_numbers: Option<Vec<u32>>,
    #[serde(default)]
    pub remediation: Option<String>,
}

impl JobReport {
    /// Requirements whose status matches `status`, ignoring case
    pub fn requirements_with_status<'a>(
        &'a self,
        status: &'a str,
    ) -> impl Iterator<Item = &'a RequirementAudit> + 'a {
        self.requirements
            .iter()
            .filter(move |req| req.status.eq_ignore_ascii_case(status))
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Verdict::Green => "GREEN",
            Verdict::Yellow => "YELLOW",
            Verdict::Red => "RED",
        };
        f.write_str(label)
    }
}

/// Accepts either a single snippet or a list of snippets
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(snippet)) => vec![snippet],
        Some(OneOrMany::Many(snippets)) => snippets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_engine_report() {
        let report: JobReport = serde_json::from_value(json!({
            "policy_id": "p-8821",
            "filename": "privacy_v2_final.pdf",
            "evaluated_at": "2026-01-30 13:42:00",
            "overall_verdict": "YELLOW",
            "requirements": [{
                "requirement_id": "req-1",
                "status": "PARTIAL",
                "reason": "Retention period lacks justification",
                "evidence": ["Clause 7.1: We retain data for 5 years"],
                "page_numbers": [4]
            }],
            "ragas_faithfulness": 0.91
        }))
        .unwrap();

        assert_eq!(report.job_id, "p-8821");
        assert_eq!(report.overall_verdict, Some(Verdict::Yellow));
        assert_eq!(report.requirements[0].reasoning, "Retention period lacks justification");
        assert_eq!(report.requirements[0].page_numbers, Some(vec![4]));
        assert_eq!(report.ragas_faithfulness, Some(0.91));
        assert!(report.score.is_none());
    }

    #[test]
    fn test_parses_alternate_field_names() {
        let report: JobReport = serde_json::from_value(json!({
            "id": "p-1",
            "verdict": "GREEN",
            "score": 88,
            "requirements": [{
                "id": "req-2",
                "title": "Data Retention Limits",
                "status": "WARNING",
                "reasoning": "No purpose-linked schedule",
                "evidence": "Clause 7.1",
                "remediation": "Link duration to legal obligations"
            }]
        }))
        .unwrap();

        let req = &report.requirements[0];
        assert_eq!(report.score, Some(88.0));
        assert_eq!(req.requirement_id, "req-2");
        assert_eq!(req.evidence, vec!["Clause 7.1".to_string()]);
        assert!(req.page_numbers.is_none());
        assert_eq!(report.requirements_with_status("warning").count(), 1);
    }

    #[test]
    fn test_unknown_verdict_is_rejected() {
        let result = serde_json::from_value::<JobReport>(json!({
            "overall_verdict": "PURPLE",
            "requirements": []
        }));
        assert!(result.is_err());
    }
}
