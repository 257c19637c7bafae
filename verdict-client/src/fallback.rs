//! Ordered fallback combinator

use std::fmt::Display;
use std::future::Future;
use thiserror::Error;
use tracing::debug;

/// Every candidate failed, or there was nothing to try
#[derive(Debug, Error)]
pub enum FallbackError<E> {
    #[error("no candidates to try")]
    NoCandidates,

    #[error("all {} candidates failed", .errors.len())]
    Exhausted {
        /// One error per candidate, in the order tried
        errors: Vec<E>,
    },
}

impl<E> FallbackError<E> {
    /// Error from the last candidate tried
    pub fn last(&self) -> Option<&E> {
        match self {
            Self::NoCandidates => None,
            Self::Exhausted { errors } => errors.last(),
        }
    }

    pub fn into_errors(self) -> Vec<E> {
        match self {
            Self::NoCandidates => Vec::new(),
            Self::Exhausted { errors } => errors,
        }
    }
}

/// Runs `op` on each candidate in order, returning the first success
///
/// Later candidates are not touched once one succeeds.
pub async fn try_in_order<C, T, E, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut op: F,
) -> Result<T, FallbackError<E>>
where
    C: Display,
    E: Display,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();

    for (index, candidate) in candidates.into_iter().enumerate() {
        let label = candidate.to_string();
        match op(candidate).await {
            Ok(value) => {
                if index > 0 {
                    debug!(candidate = %label, attempt = index + 1, "Fallback candidate succeeded");
                }
                return Ok(value);
            }
            Err(e) => {
                debug!(candidate = %label, attempt = index + 1, error = %e, "Candidate failed");
                errors.push(e);
            }
        }
    }

    if errors.is_empty() {
        Err(FallbackError::NoCandidates)
    } else {
        Err(FallbackError::Exhausted { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_short_circuits_on_first_success() {
        let mut tried = Vec::new();
        let result: Result<&str, FallbackError<String>> =
            try_in_order(["a", "b", "c"], |c| {
                tried.push(c);
                async move {
                    if c == "b" {
                        Ok(c)
                    } else {
                        Err(format!("{} failed", c))
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "b");
        assert_eq!(tried, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_collects_every_error_in_order() {
        let result: Result<(), FallbackError<String>> =
            try_in_order(["a", "b"], |c| async move { Err(format!("{} failed", c)) }).await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "all 2 candidates failed");
        assert_eq!(err.last().map(String::as_str), Some("b failed"));
        assert_eq!(err.into_errors(), vec!["a failed", "b failed"]);
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let result: Result<(), FallbackError<String>> =
            try_in_order(Vec::<&str>::new(), |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(FallbackError::NoCandidates)));
    }
}
