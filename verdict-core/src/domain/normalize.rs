//! Report shape normalization
//!
//! The engine has shipped reports under a `report` wrapper and at the top
//! level, with the requirement list named `requirements` or `findings`.
//! [`normalize_report`] folds those into one canonical shape. It never fails:
//! a payload it cannot place is handed back untouched and flagged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::report::JobReport;

const WRAPPER_KEY: &str = "report";
const REQUIREMENTS_KEY: &str = "requirements";
const FINDINGS_KEY: &str = "findings";

/// How a report payload was recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportShape {
    /// Already canonical
    Canonical,
    /// Canonical after unwrapping and/or renaming `findings`
    Adapted { unwrapped: bool, findings_aliased: bool },
    /// Neither shape; payload passed through as received
    Unrecognized,
}

/// A report payload after shape normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub payload: Value,
    pub shape: ReportShape,
}

impl NormalizedReport {
    pub fn is_recognized(&self) -> bool {
        self.shape != ReportShape::Unrecognized
    }

    /// The canonical requirement list, if the payload had one
    pub fn requirements(&self) -> Option<&Vec<Value>> {
        if !self.is_recognized() {
            return None;
        }
        self.payload.get(REQUIREMENTS_KEY)?.as_array()
    }

    /// Decodes the payload into a typed [`JobReport`]
    pub fn to_report(&self) -> Result<JobReport, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Normalizes a raw report payload
pub fn normalize_report(raw: Value) -> NormalizedReport {
    let (mut candidate, unwrapped) = match raw.get(WRAPPER_KEY) {
        Some(inner @ Value::Object(_)) => (inner.clone(), true),
        _ => (raw.clone(), false),
    };

    let mut findings_aliased = false;
    if let Value::Object(map) = &mut candidate {
        if !map.contains_key(REQUIREMENTS_KEY) {
            if let Some(findings) = map.remove(FINDINGS_KEY) {
                map.insert(REQUIREMENTS_KEY.to_string(), findings);
                findings_aliased = true;
            }
        }
    }

    let recognized = candidate
        .get(REQUIREMENTS_KEY)
        .is_some_and(Value::is_array);

    if !recognized {
        return NormalizedReport {
            payload: raw,
            shape: ReportShape::Unrecognized,
        };
    }

    let shape = if unwrapped || findings_aliased {
        ReportShape::Adapted {
            unwrapped,
            findings_aliased,
        }
    } else {
        ReportShape::Canonical
    };

    NormalizedReport {
        payload: candidate,
        shape,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn findings() -> Value {
        json!([
            {"requirement_id": "req-1", "status": "COVERED", "reason": "ok", "evidence": []},
            {"requirement_id": "req-2", "status": "NOT_COVERED", "reason": "missing", "evidence": []}
        ])
    }

    #[test]
    fn test_wrapped_findings_match_canonical_payload() {
        let wrapped = normalize_report(json!({"report": {"findings": findings()}}));
        let canonical = normalize_report(json!({"requirements": findings()}));

        assert_eq!(wrapped.payload, canonical.payload);
        assert_eq!(canonical.shape, ReportShape::Canonical);
        assert_eq!(
            wrapped.shape,
            ReportShape::Adapted {
                unwrapped: true,
                findings_aliased: true
            }
        );
    }

    #[test]
    fn test_unwraps_without_alias() {
        let report = normalize_report(json!({"report": {"requirements": [], "score": 40}}));
        assert_eq!(report.payload, json!({"requirements": [], "score": 40}));
        assert_eq!(
            report.shape,
            ReportShape::Adapted {
                unwrapped: true,
                findings_aliased: false
            }
        );
    }

    #[test]
    fn test_requirements_win_over_findings() {
        let report = normalize_report(json!({"requirements": [1], "findings": [2]}));
        assert_eq!(report.shape, ReportShape::Canonical);
        assert_eq!(report.requirements(), Some(&vec![json!(1)]));
    }

    #[test]
    fn test_unrecognized_payload_is_passed_through() {
        let raw = json!({"report": {"summary": "n/a"}, "status": "COMPLETED"});
        let report = normalize_report(raw.clone());

        assert_eq!(report.shape, ReportShape::Unrecognized);
        assert_eq!(report.payload, raw);
        assert!(report.requirements().is_none());
    }

    #[test]
    fn test_non_object_payloads_never_panic() {
        for raw in [json!(null), json!("text"), json!([1, 2]), json!({"report": 3})] {
            let report = normalize_report(raw.clone());
            assert!(!report.is_recognized());
            assert_eq!(report.payload, raw);
        }
    }

    #[test]
    fn test_findings_must_be_a_list() {
        let raw = json!({"findings": "none"});
        let report = normalize_report(raw.clone());
        assert_eq!(report.shape, ReportShape::Unrecognized);
        assert_eq!(report.payload, raw);
    }

    #[test]
    fn test_typed_view() {
        let report = normalize_report(json!({"report": {
            "policy_id": "p-1",
            "overall_verdict": "RED",
            "findings": findings()
        }}));
        let typed = report.to_report().unwrap();
        assert_eq!(typed.job_id, "p-1");
        assert_eq!(typed.requirements.len(), 2);
    }
}
