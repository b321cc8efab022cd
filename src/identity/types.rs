//! Identity types — provider-neutral users, tokens and errors.

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by auth provider operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthProviderError {
    /// The provider rejected the presented token.
    #[error("session token rejected")]
    Unauthorized,

    /// The provider refused the request with a user-facing message
    /// (bad credentials, duplicate sign-up, weak password).
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The HTTP request to the provider failed.
    #[error("auth provider request failed: {0}")]
    Request(String),

    /// The provider returned a non-success status we do not interpret.
    #[error("auth provider response error: status {status}")]
    Response { status: u16, body: String },

    /// The provider response body could not be deserialized.
    #[error("auth provider response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl AuthProviderError {
    /// Transport and upstream failures, as opposed to a verdict on the user.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { .. } | Self::Parse(_) | Self::HttpClientBuild(_))
    }
}

// =============================================================================
// USERS AND TOKENS
// =============================================================================

/// Identity attached to a valid session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Provider-assigned user identifier.
    pub id: String,
    /// Primary email, when the provider reports one.
    #[serde(default)]
    pub email: Option<String>,
}

/// Access/refresh token pair issued by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: Option<u64>,
}

/// A freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub tokens: SessionTokens,
    pub user: SessionUser,
}

/// Result of a sign-up call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The provider auto-confirmed the account and issued a session.
    Confirmed(AuthGrant),
    /// The account exists but waits for email confirmation.
    PendingConfirmation { user: SessionUser },
}

// =============================================================================
// AUTH PROVIDER TRAIT
// =============================================================================

/// Async trait over the external auth service. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange email + password for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthGrant, AuthProviderError>;

    /// Register a new account. `redirect_to` is where the confirmation email links.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError>;

    /// Validate an access token, returning its user.
    ///
    /// # Errors
    ///
    /// [`AuthProviderError::Unauthorized`] when the token is expired or invalid.
    async fn get_user(&self, access_token: &str) -> Result<SessionUser, AuthProviderError>;

    /// Trade a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// [`AuthProviderError::Unauthorized`] when the refresh token is no longer valid.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthGrant, AuthProviderError>;

    /// Revoke the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError>;
}
