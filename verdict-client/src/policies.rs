//! Session, policy listing and admin endpoints

use verdict_core::dto::admin::{AuditLogRecord, UserRecord};
use verdict_core::dto::auth::{AccessToken, LoginForm};
use verdict_core::dto::policy::PolicySummary;

use crate::AuditClient;
use crate::error::Result;

impl AuditClient {
    // =============================================================================
    // Session
    // =============================================================================

    /// Exchange a username and password for a bearer token
    ///
    /// The token is returned, not stored; hand it to a
    /// [`SessionToken`](crate::SessionToken) or persist it as needed.
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let url = self.url("/login/access-token");
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.send(self.client.post(&url).form(&form)).await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Listings
    // =============================================================================

    /// List submitted policies
    pub async fn list_policies(&self) -> Result<Vec<PolicySummary>> {
        let url = self.url("/policies/");
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }

    /// List registered users (admin only)
    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let url = self.url("/users/");
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }

    /// List the engine's audit trail (admin only)
    pub async fn list_audit_logs(&self) -> Result<Vec<AuditLogRecord>> {
        let url = self.url("/logs/");
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }
}
