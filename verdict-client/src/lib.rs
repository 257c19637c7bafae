//! Verdict HTTP Client
//!
//! A type-safe HTTP client for the audit engine API.
//!
//! The client is shared by the reconciler (which polls job status and fetches
//! reports) and the CLI (which also submits jobs and lists policies).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use verdict_client::{AuditClient, StaticToken};
//! use verdict_client::paths::default_status_paths;
//!
//! # async fn example() -> verdict_client::Result<()> {
//! let client = AuditClient::with_credentials(
//!     "http://localhost:8000/api/v1",
//!     Arc::new(StaticToken::new("secret")),
//! );
//!
//! let status = client.get_status("p-123", &default_status_paths()[0]).await?;
//! println!("{} at {}%", status.raw_status, status.progress_percent());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod fallback;
mod jobs;
pub mod paths;
mod policies;

// Re-export commonly used types
pub use auth::{
    BearerAuth, CredentialProvider, Middleware, NoCredentials, SessionInvalidation, SessionToken,
    StaticToken,
};
pub use error::{ClientError, Result};
pub use fallback::{FallbackError, try_in_order};
pub use jobs::parse_status;
pub use paths::PathTemplate;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Default API base used by the engine's own front-ends
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Read-only JSON access to the engine, by path relative to the API base
///
/// This is the seam the reconciler's repositories are written against.
#[async_trait]
pub trait JsonTransport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value>;
}

/// HTTP client for the audit engine API
///
/// Endpoints are grouped as:
/// - Job tracking (status, report, source PDF)
/// - Job submission (policy upload)
/// - Session and admin listings (login, policies, users, audit logs)
#[derive(Debug, Clone)]
pub struct AuditClient {
    /// Base URL of the API (e.g., "http://localhost:8000/api/v1")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Interceptors applied to every request, in order
    middleware: Vec<Arc<dyn Middleware>>,
}

impl AuditClient {
    /// Create a client without credentials
    ///
    /// # Example
    /// ```
    /// use verdict_client::AuditClient;
    ///
    /// let client = AuditClient::new("http://localhost:8000/api/v1");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            middleware: Vec::new(),
        }
    }

    /// Create a client that authenticates with `credentials`
    ///
    /// Installs [`BearerAuth`] and [`SessionInvalidation`] for the provider.
    pub fn with_credentials(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self::new(base_url)
            .with_middleware(BearerAuth::new(credentials.clone()))
            .with_middleware(SessionInvalidation::new(credentials))
    }

    /// Appends a middleware to the chain
    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Get the base URL of the API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Runs the middleware chain around a request
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = self
            .middleware
            .iter()
            .fold(request, |request, m| m.on_request(request));

        let response = request.send().await?;

        for m in &self.middleware {
            m.on_response(response.status());
        }

        Ok(response)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is raw bytes
    async fn handle_bytes(&self, response: Response) -> Result<Vec<u8>> {
        let response = Self::check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl JsonTransport for AuditClient {
    async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.send(self.client.get(self.url(path))).await?;
        self.handle_response(response).await
    }
}
