//! Configuration module
//!
//! Handles CLI configuration: where the engine lives and how to authenticate.

use std::sync::Arc;
use verdict_client::{AuditClient, CredentialProvider, NoCredentials, StaticToken};

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the audit engine API
    pub api_url: String,
    /// Bearer token, if any
    pub token: Option<String>,
}

impl Config {
    /// Builds an API client for this configuration
    pub fn client(&self) -> AuditClient {
        AuditClient::with_credentials(&self.api_url, self.credentials())
    }

    fn credentials(&self) -> Arc<dyn CredentialProvider> {
        match &self.token {
            Some(token) if !token.trim().is_empty() => Arc::new(StaticToken::new(token.trim())),
            _ => Arc::new(NoCredentials),
        }
    }
}
