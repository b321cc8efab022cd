//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! into the route guard middleware. It holds the parsed config, the routing
//! guard, trait objects for the auth provider and inference backend, the
//! optional document and completion clients, and the per-user chat
//! histories.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::backend::ChatBackend;
use crate::backend::completions::CompletionsClient;
use crate::backend::documents::DocumentsClient;
use crate::config::AppConfig;
use crate::guard::RouteGuard;
use crate::identity::AuthProvider;
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::services::history::ChatHistory;

/// Chat histories keyed by the auth provider's user id.
pub type ChatStore = Arc<RwLock<HashMap<String, ChatHistory>>>;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state. Clone is required by Axum; all inner fields
/// are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub guard: Arc<RouteGuard>,
    pub auth: Arc<dyn AuthProvider>,
    pub backend: Arc<dyn ChatBackend>,
    /// Document store client. `None` if `DOCUMENTS_API_URL` is not set.
    pub documents: Option<Arc<DocumentsClient>>,
    /// Streaming completions client. `None` if `OPENAI_API_KEY` is not set.
    pub completions: Option<Arc<CompletionsClient>>,
    pub chats: ChatStore,
    /// In-memory rate limiter for chat sends and completions.
    pub rate_limiter: RateLimiter,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig, auth: Arc<dyn AuthProvider>, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            config: Arc::new(config),
            guard: Arc::new(RouteGuard::standard()),
            auth,
            backend,
            documents: None,
            completions: None,
            chats: Arc::new(RwLock::new(HashMap::new())),
            rate_limiter: RateLimiter::with_config(RateLimitConfig::default()),
        }
    }

    #[must_use]
    pub fn with_documents(mut self, documents: Option<Arc<DocumentsClient>>) -> Self {
        self.documents = documents;
        self
    }

    #[must_use]
    pub fn with_completions(mut self, completions: Option<Arc<CompletionsClient>>) -> Self {
        self.completions = completions;
        self
    }

    /// Replace the default limits, e.g. with [`RateLimiter::new`] for env-tuned ones.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
#[path = "state_helpers_test.rs"]
pub mod test_helpers;
