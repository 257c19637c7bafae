//! Credentials and request middleware
//!
//! The client never reads tokens from ambient state. A [`CredentialProvider`]
//! is handed to it at construction, and [`Middleware`] values wrap every
//! request and observe every response in the order they were added.

use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Source of the bearer token attached to requests
pub trait CredentialProvider: Debug + Send + Sync {
    /// Current token, if any
    fn bearer_token(&self) -> Option<String>;

    /// Drops the current token after the engine rejected it
    ///
    /// Providers that cannot forget their token ignore this.
    fn invalidate(&self) {}
}

/// Provider that never supplies a token
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Fixed token, e.g. from a CLI flag
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Token obtained at runtime that is dropped on `401`
#[derive(Debug, Default)]
pub struct SessionToken {
    token: RwLock<Option<String>>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(token.into());
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }
}

impl CredentialProvider for SessionToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn invalidate(&self) {
        let mut slot = self.token.write().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

/// Request/response interceptor
pub trait Middleware: Debug + Send + Sync {
    /// Adjusts an outgoing request
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    /// Observes the status of a response before it is decoded
    fn on_response(&self, _status: StatusCode) {}
}

/// Attaches `Authorization: Bearer <token>` when a token is available
#[derive(Debug, Clone)]
pub struct BearerAuth {
    credentials: Arc<dyn CredentialProvider>,
}

impl BearerAuth {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

impl Middleware for BearerAuth {
    fn on_request(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }
}

/// Invalidates the session credential when the engine answers `401`
#[derive(Debug, Clone)]
pub struct SessionInvalidation {
    credentials: Arc<dyn CredentialProvider>,
}

impl SessionInvalidation {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }
}

impl Middleware for SessionInvalidation {
    fn on_response(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            warn!("Audit engine rejected credentials, invalidating session");
            self.credentials.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_header(middleware: &dyn Middleware) -> Option<String> {
        let request = middleware
            .on_request(reqwest::Client::new().get("http://localhost:8000/api/v1/p-1/status"))
            .build()
            .unwrap();
        request
            .headers()
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_bearer_auth_attaches_token() {
        let auth = BearerAuth::new(Arc::new(StaticToken::new("abc")));
        assert_eq!(auth_header(&auth), Some("Bearer abc".to_string()));
    }

    #[test]
    fn test_bearer_auth_without_token() {
        let auth = BearerAuth::new(Arc::new(NoCredentials));
        assert_eq!(auth_header(&auth), None);
    }

    #[test]
    fn test_unauthorized_response_invalidates_session() {
        let session = Arc::new(SessionToken::new());
        session.set("abc");
        let auth = BearerAuth::new(session.clone());
        let invalidation = SessionInvalidation::new(session.clone());

        invalidation.on_response(StatusCode::OK);
        assert!(session.is_authenticated());

        invalidation.on_response(StatusCode::UNAUTHORIZED);
        assert!(!session.is_authenticated());
        assert_eq!(auth_header(&auth), None);
    }

    #[test]
    fn test_static_token_survives_invalidation() {
        let token = StaticToken::new("fixed");
        token.invalidate();
        assert_eq!(token.bearer_token().as_deref(), Some("fixed"));
    }
}
