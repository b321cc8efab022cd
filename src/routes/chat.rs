//! Chat routes — history CRUD, message sends and ChatKit session creation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error_response;
use crate::backend::BackendError;
use crate::services::chat::{self as chat_svc, ChatError};
use crate::state::AppState;

pub(crate) fn chat_error_to_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::NotFound(_) => StatusCode::NOT_FOUND,
        ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
        ChatError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
    }
}

fn chat_error_response(err: &ChatError) -> Response {
    error_response(chat_error_to_status(err), err.to_string())
}

/// `GET /api/chats` — the user's chats, newest first.
pub async fn list_chats(State(state): State<AppState>, auth: AuthUser) -> Response {
    Json(chat_svc::list_chats(&state, &auth.user.id).await).into_response()
}

/// `POST /api/chats` — start a new chat.
pub async fn create_chat(State(state): State<AppState>, auth: AuthUser) -> Response {
    let chat = chat_svc::create_chat(&state, &auth.user.id).await;
    (StatusCode::CREATED, Json(chat)).into_response()
}

/// `GET /api/chats/{id}` — full chat, made current.
pub async fn get_chat(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Response {
    match chat_svc::open_chat(&state, &auth.user.id, id).await {
        Ok(chat) => Json(chat).into_response(),
        Err(e) => chat_error_response(&e),
    }
}

/// `DELETE /api/chats/{id}` — remove a chat, returning the new listing.
pub async fn delete_chat(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Response {
    match chat_svc::delete_chat(&state, &auth.user.id, id).await {
        Ok(list) => Json(list).into_response(),
        Err(e) => chat_error_response(&e),
    }
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    content: String,
}

/// `POST /api/chats/{id}/messages` — send a message and return the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    match chat_svc::send_message(&state, &auth.user.id, id, &body.content).await {
        Ok(exchange) => Json(exchange).into_response(),
        Err(e) => chat_error_response(&e),
    }
}

/// `POST /api/chatkit/session` — open a ChatKit session for the browser.
pub async fn chatkit_session(State(state): State<AppState>, _auth: AuthUser) -> Response {
    match state.backend.create_chatkit_session().await {
        Ok(secret) => Json(json!({ "clientSecret": secret })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chatkit session creation failed");
            backend_error_response(&e)
        }
    }
}

pub(crate) fn backend_error_response(err: &BackendError) -> Response {
    if let Some(status) = err.status() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        return error_response(status, err.to_string());
    }
    match err {
        BackendError::InvalidJson => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to create ChatKit session: {err}")),
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
