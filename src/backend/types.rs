//! Backend types — transcript wire messages, the messaging trait and errors.

use serde::{Deserialize, Serialize};

const BODY_EXCERPT_CHARS: usize = 100;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by inference backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request to the backend failed.
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend returned a non-success status. `body` holds an excerpt.
    #[error("Backend error: {body}")]
    Response { status: u16, body: String },

    /// The backend answered with something other than JSON.
    #[error("Backend returned invalid JSON")]
    InvalidJson,

    /// A session response carried no client secret.
    #[error("backend session response missing client secret")]
    MissingClientSecret,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl BackendError {
    /// Upstream status to mirror back to the caller, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// First 100 characters of an upstream body, for error messages.
#[must_use]
pub fn body_excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

// =============================================================================
// WIRE MESSAGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One transcript entry as sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

// =============================================================================
// CHAT BACKEND TRAIT
// =============================================================================

/// The two messaging backends exposed by the inference service. Enables
/// mocking in tests.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open a ChatKit session, returning its client secret.
    async fn create_chatkit_session(&self) -> Result<String, BackendError>;

    /// Send one message through an open ChatKit session.
    async fn send_chatkit_message(&self, message: &str, session_id: &str) -> Result<String, BackendError>;

    /// Send the whole transcript to the stateless chat endpoint.
    async fn send_chat(&self, messages: &[WireMessage]) -> Result<String, BackendError>;
}
