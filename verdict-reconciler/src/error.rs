//! Fetch error taxonomy
//!
//! Status and report sources reduce every failure to one of two kinds.
//! Neither is fatal: a transient status failure is absorbed by the next
//! poll, and a not-ready report moves on to the next report path.

use thiserror::Error;
use verdict_client::{ClientError, FallbackError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network failure, server error or undecodable payload
    #[error("transient failure: {0}")]
    Transient(String),

    /// The resource does not exist (yet) at the requested path
    #[error("not ready: {0}")]
    NotReady(String),
}

impl FetchError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }
}

impl From<ClientError> for FetchError {
    fn from(e: ClientError) -> Self {
        if e.is_not_found() {
            Self::NotReady(e.to_string())
        } else {
            Self::Transient(e.to_string())
        }
    }
}

impl From<FallbackError<FetchError>> for FetchError {
    /// Collapses one error per path into a single error
    ///
    /// The result is `NotReady` only when every path said so.
    fn from(e: FallbackError<FetchError>) -> Self {
        let errors = e.into_errors();
        if errors.is_empty() {
            return Self::Transient("no resource paths configured".to_string());
        }

        let all_not_ready = errors.iter().all(FetchError::is_not_ready);
        let message = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        if all_not_ready {
            Self::NotReady(message)
        } else {
            Self::Transient(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        assert!(FetchError::from(ClientError::api_error(404, "missing")).is_not_ready());
        assert!(!FetchError::from(ClientError::api_error(502, "bad gateway")).is_not_ready());
        assert!(!FetchError::from(ClientError::api_error(401, "expired")).is_not_ready());
    }

    #[test]
    fn test_fallback_collapse() {
        let all_missing = FallbackError::Exhausted {
            errors: vec![
                FetchError::NotReady("a".into()),
                FetchError::NotReady("b".into()),
            ],
        };
        assert_eq!(
            FetchError::from(all_missing),
            FetchError::NotReady("not ready: a; not ready: b".into())
        );

        let mixed = FallbackError::Exhausted {
            errors: vec![
                FetchError::NotReady("a".into()),
                FetchError::Transient("b".into()),
            ],
        };
        assert!(matches!(FetchError::from(mixed), FetchError::Transient(_)));

        assert!(matches!(
            FetchError::from(FallbackError::<FetchError>::NoCandidates),
            FetchError::Transient(_)
        ));
    }
}
