//! Chat service — per-user chat history and message delivery.
//!
//! ARCHITECTURE
//! ============
//! Histories live in `AppState::chats`, keyed by the auth provider's user id.
//! A send appends the user message under the write lock, releases it for the
//! backend round-trip, then re-acquires it to append the reply. Backend
//! failures never surface as errors: the chat receives an apology reply and
//! the exchange is flagged as undelivered.
//!
//! ChatKit sessions are opened lazily on a user's first send. When opening
//! fails the session is marked unavailable and every later send goes to the
//! stateless chat endpoint with the full transcript.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::rate_limit::RateLimitError;
use crate::services::history::{Chat, ChatHistory, ChatMessage, ChatSummary, ChatkitSession, now_millis};
use crate::state::AppState;

pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat not found: {0}")]
    NotFound(Uuid),
    #[error("message content is empty")]
    EmptyMessage,
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
}

/// Sidebar listing for one user.
#[derive(Debug, Clone, Serialize)]
pub struct ChatList {
    pub current: Option<Uuid>,
    pub chats: Vec<ChatSummary>,
}

/// One user message and the assistant reply it produced.
#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub chat_id: Uuid,
    pub title: String,
    pub user_message: ChatMessage,
    pub reply: ChatMessage,
    /// False when the backend failed and `reply` is the apology text.
    pub delivered: bool,
}

// =============================================================================
// HISTORY OPERATIONS
// =============================================================================

/// List a user's chats, seeding a first chat for new users.
pub async fn list_chats(state: &AppState, user_id: &str) -> ChatList {
    let now = now_millis();
    let mut chats = state.chats.write().await;
    let history = chats.entry(user_id.to_owned()).or_insert_with(ChatHistory::new);
    history.ensure_started(now);
    ChatList { current: history.current_id(), chats: history.summaries(now) }
}

/// Start a new chat and make it current.
pub async fn create_chat(state: &AppState, user_id: &str) -> Chat {
    let mut chats = state.chats.write().await;
    let history = chats.entry(user_id.to_owned()).or_insert_with(ChatHistory::new);
    let chat = history.create_chat(now_millis()).clone();
    info!(user_id, chat_id = %chat.id, "chat: created");
    chat
}

/// Fetch a chat and make it current.
///
/// # Errors
///
/// Returns `NotFound` if the user has no chat with that id.
pub async fn open_chat(state: &AppState, user_id: &str, chat_id: Uuid) -> Result<Chat, ChatError> {
    let mut chats = state.chats.write().await;
    let history = chats
        .get_mut(user_id)
        .ok_or(ChatError::NotFound(chat_id))?;
    if !history.select(chat_id) {
        return Err(ChatError::NotFound(chat_id));
    }
    history
        .get(chat_id)
        .cloned()
        .ok_or(ChatError::NotFound(chat_id))
}

/// Delete a chat, returning the listing that results.
///
/// # Errors
///
/// Returns `NotFound` if the user has no chat with that id.
pub async fn delete_chat(state: &AppState, user_id: &str, chat_id: Uuid) -> Result<ChatList, ChatError> {
    let now = now_millis();
    let mut chats = state.chats.write().await;
    let history = chats
        .get_mut(user_id)
        .ok_or(ChatError::NotFound(chat_id))?;
    if !history.delete_chat(chat_id, now) {
        return Err(ChatError::NotFound(chat_id));
    }
    info!(user_id, %chat_id, "chat: deleted");
    Ok(ChatList { current: history.current_id(), chats: history.summaries(now) })
}

// =============================================================================
// MESSAGING
// =============================================================================

/// Send a user message in a chat and append the assistant's reply.
///
/// # Errors
///
/// Returns `EmptyMessage` for blank content, `NotFound` for an unknown chat,
/// and `RateLimited` when the user or the server is over its send budget.
pub async fn send_message(
    state: &AppState,
    user_id: &str,
    chat_id: Uuid,
    content: &str,
) -> Result<ChatExchange, ChatError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ChatError::EmptyMessage);
    }

    let (user_message, transcript) = {
        let mut chats = state.chats.write().await;
        let history = chats
            .get_mut(user_id)
            .filter(|history| history.get(chat_id).is_some())
            .ok_or(ChatError::NotFound(chat_id))?;
        // Only sends to an existing chat count against the budget.
        state.rate_limiter.check_and_record(user_id)?;
        let message = history
            .push_user_message(chat_id, content)
            .ok_or(ChatError::NotFound(chat_id))?;
        history.select(chat_id);
        let transcript = history.transcript(chat_id).unwrap_or_default();
        (message, transcript)
    };

    let reply = match ensure_chatkit(state, user_id).await {
        Some(session_id) => {
            state
                .backend
                .send_chatkit_message(content, &session_id)
                .await
        }
        None => state.backend.send_chat(&transcript).await,
    };
    let (reply_text, delivered) = match reply {
        Ok(text) => (text, true),
        Err(e) => {
            warn!(user_id, %chat_id, error = %e, "chat: backend send failed");
            (ERROR_REPLY.to_owned(), false)
        }
    };

    let mut chats = state.chats.write().await;
    let history = chats
        .get_mut(user_id)
        .ok_or(ChatError::NotFound(chat_id))?;
    let reply = history
        .push_assistant_message(chat_id, &reply_text)
        .ok_or(ChatError::NotFound(chat_id))?;
    let title = history
        .get(chat_id)
        .map(|chat| chat.title.clone())
        .unwrap_or_default();

    Ok(ChatExchange { chat_id, title, user_message, reply, delivered })
}

/// Return the user's ChatKit session id, opening one on first use.
///
/// `None` means ChatKit is unavailable for this user and the stateless chat
/// endpoint should be used.
pub async fn ensure_chatkit(state: &AppState, user_id: &str) -> Option<String> {
    {
        let chats = state.chats.read().await;
        match chats.get(user_id).map(ChatHistory::chatkit) {
            Some(ChatkitSession::Ready(id)) => return Some(id.clone()),
            Some(ChatkitSession::Unavailable) => return None,
            Some(ChatkitSession::Uninitialized) | None => {}
        }
    }

    let opened = match state.backend.create_chatkit_session().await {
        Ok(secret) => {
            info!(user_id, "chat: chatkit session opened");
            ChatkitSession::Ready(secret)
        }
        Err(e) => {
            warn!(user_id, error = %e, "chat: chatkit unavailable, using stateless chat");
            ChatkitSession::Unavailable
        }
    };

    // A concurrent send may have settled the session while the lock was released.
    let mut chats = state.chats.write().await;
    let history = chats.entry(user_id.to_owned()).or_insert_with(ChatHistory::new);
    if *history.chatkit() == ChatkitSession::Uninitialized {
        history.set_chatkit(opened);
    }
    match history.chatkit() {
        ChatkitSession::Ready(id) => Some(id.clone()),
        ChatkitSession::Uninitialized | ChatkitSession::Unavailable => None,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
