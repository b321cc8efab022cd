//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON API routes live under `/api` with permissive CORS. The landing, auth
//! and chat pages are static files served from `STATIC_DIR` as the router
//! fallback. The route guard wraps the whole router so page navigations are
//! redirected before they reach the file server; `/api`, `/static` and the
//! other excluded prefixes pass straight through it. API routes resolve the
//! session once in their own layer and authenticate per handler with the
//! `AuthUser` extractor.

pub mod auth;
pub mod chat;
pub mod completions;
pub mod documents;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::guard::middleware::{api_session, route_guard};
use crate::services::attachment::{MAX_ATTACHMENTS, MAX_ATTACHMENT_BYTES};
use crate::state::AppState;

/// Multipart overhead allowed on top of the attachment payload.
const UPLOAD_BODY_SLACK: usize = 1024 * 1024;

/// JSON API routes.
fn api_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/chats", get(chat::list_chats).post(chat::create_chat))
        .route("/api/chats/{id}", get(chat::get_chat).delete(chat::delete_chat))
        .route("/api/chats/{id}/messages", post(chat::send_message))
        .route("/api/chatkit/session", post(chat::chatkit_session))
        .route("/api/chat", post(completions::stream_chat))
        .route(
            "/api/documents/upload",
            post(documents::upload_documents)
                .layer(DefaultBodyLimit::max(MAX_ATTACHMENTS * MAX_ATTACHMENT_BYTES + UPLOAD_BODY_SLACK)),
        )
        .route("/api/documents/text", post(documents::upload_text))
        .route("/api/vector/query", post(documents::query_vectors))
        .route_layer(middleware::from_fn_with_state(state.clone(), api_session))
        .layer(cors)
        .with_state(state)
}

/// Full application: API, health check, static site, guard and tracing.
pub fn app(state: AppState) -> Router {
    let site = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    api_routes(state.clone())
        .route("/healthz", get(healthz))
        .fallback_service(site)
        .layer(middleware::from_fn_with_state(state, route_guard))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// `{ "error": message }` with `status`.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
