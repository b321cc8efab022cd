//! Streaming completions route.

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::warn;

use super::auth::AuthUser;
use super::error_response;
use crate::backend::WireMessage;
use crate::backend::completions::CompletionError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StreamChatRequest {
    messages: Vec<WireMessage>,
}

pub(crate) fn completion_error_to_status(err: &CompletionError) -> StatusCode {
    match err {
        CompletionError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CompletionError::Request(_) | CompletionError::Response { .. } | CompletionError::Stream(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// `POST /api/chat` — stream the completion's text deltas as `text/plain`.
pub async fn stream_chat(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<StreamChatRequest>,
) -> Response {
    let Some(client) = state.completions.clone() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Completions not configured");
    };
    if let Err(e) = state.rate_limiter.check_and_record(&auth.user.id) {
        return error_response(StatusCode::TOO_MANY_REQUESTS, e.to_string());
    }

    match client.stream(&body.messages).await {
        Ok(deltas) => ([(CONTENT_TYPE, "text/plain; charset=utf-8")], Body::from_stream(deltas)).into_response(),
        Err(e) => {
            warn!(user_id = %auth.user.id, model = client.model(), error = %e, "completions: stream failed");
            error_response(completion_error_to_status(&e), e.to_string())
        }
    }
}

#[cfg(test)]
#[path = "completions_test.rs"]
mod tests;
