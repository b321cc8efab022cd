//! Per-user chat history.
//!
//! DESIGN
//! ======
//! A `ChatHistory` is the list of a user's chats, newest first, plus which
//! chat is selected and the state of the user's ChatKit session. Everything
//! here is synchronous and in-memory; the chat service wraps it in the shared
//! store and does the network calls outside the lock.
//!
//! Timestamps are unix milliseconds so the module stays free of clock access
//! except through [`now_millis`].

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::backend::{Role, WireMessage};

pub const NEW_CHAT_TITLE: &str = "New Chat";
pub const GREETING: &str = "Hello! I'm your OpenAI Agent. How can I help you today?";
pub const TITLE_MAX_CHARS: usize = 30;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

// =============================================================================
// CHATS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into() }
    }

    fn to_wire(&self) -> WireMessage {
        WireMessage { role: self.role, content: self.content.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chat {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl Chat {
    #[must_use]
    pub fn new(created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: NEW_CHAT_TITLE.to_owned(),
            messages: vec![ChatMessage::new(Role::Assistant, GREETING)],
            created_at,
        }
    }
}

/// Sidebar entry for one chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub id: Uuid,
    pub title: String,
    pub created_at: i64,
    pub age: String,
    pub message_count: usize,
}

/// ChatKit session state for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ChatkitSession {
    #[default]
    Uninitialized,
    Ready(String),
    /// Session creation failed; messages use the stateless chat endpoint.
    Unavailable,
}

// =============================================================================
// HISTORY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    chats: Vec<Chat>,
    current: Option<Uuid>,
    chatkit: ChatkitSession,
}

impl ChatHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A history is never shown empty: seed a first chat when there is none.
    pub fn ensure_started(&mut self, now: i64) {
        if self.chats.is_empty() {
            self.create_chat(now);
        }
    }

    /// Prepend a fresh chat and select it.
    pub fn create_chat(&mut self, now: i64) -> &Chat {
        let chat = Chat::new(now);
        self.current = Some(chat.id);
        self.chats.insert(0, chat);
        &self.chats[0]
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == id)
    }

    /// The selected chat, or the first one when the selection is stale.
    #[must_use]
    pub fn current_chat(&self) -> Option<&Chat> {
        self.current
            .and_then(|id| self.get(id))
            .or_else(|| self.chats.first())
    }

    #[must_use]
    pub fn current_id(&self) -> Option<Uuid> {
        self.current_chat().map(|c| c.id)
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.get(id).is_some() {
            self.current = Some(id);
            true
        } else {
            false
        }
    }

    /// Append a user message. The first user message of a chat also titles it.
    pub fn push_user_message(&mut self, chat_id: Uuid, content: &str) -> Option<ChatMessage> {
        let chat = self.chats.iter_mut().find(|c| c.id == chat_id)?;
        if chat.messages.len() == 1 {
            chat.title = title_from(content);
        }
        let message = ChatMessage::new(Role::User, content);
        chat.messages.push(message.clone());
        Some(message)
    }

    pub fn push_assistant_message(&mut self, chat_id: Uuid, content: &str) -> Option<ChatMessage> {
        let chat = self.chats.iter_mut().find(|c| c.id == chat_id)?;
        let message = ChatMessage::new(Role::Assistant, content);
        chat.messages.push(message.clone());
        Some(message)
    }

    /// The chat's messages in backend wire form.
    #[must_use]
    pub fn transcript(&self, chat_id: Uuid) -> Option<Vec<WireMessage>> {
        self.get(chat_id)
            .map(|chat| chat.messages.iter().map(ChatMessage::to_wire).collect())
    }

    /// Remove a chat. Deleting the selected chat selects the first remaining
    /// one, or a fresh chat when none remain.
    pub fn delete_chat(&mut self, id: Uuid, now: i64) -> bool {
        let before = self.chats.len();
        self.chats.retain(|c| c.id != id);
        if self.chats.len() == before {
            return false;
        }
        if self.current == Some(id) {
            self.current = self.chats.first().map(|c| c.id);
            if self.chats.is_empty() {
                self.create_chat(now);
            }
        }
        true
    }

    #[must_use]
    pub fn summaries(&self, now: i64) -> Vec<ChatSummary> {
        self.chats
            .iter()
            .map(|chat| ChatSummary {
                id: chat.id,
                title: chat.title.clone(),
                created_at: chat.created_at,
                age: format_age(chat.created_at, now),
                message_count: chat.messages.len(),
            })
            .collect()
    }

    #[must_use]
    pub fn chatkit(&self) -> &ChatkitSession {
        &self.chatkit
    }

    pub fn set_chatkit(&mut self, session: ChatkitSession) {
        self.chatkit = session;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// First 30 characters of the message, with `...` when it was longer.
#[must_use]
pub fn title_from(content: &str) -> String {
    let mut title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

/// Relative age label: `Just now`, `5m ago`, `3h ago`, `2d ago`, else the date.
#[must_use]
pub fn format_age(created_at: i64, now: i64) -> String {
    let diff = now.saturating_sub(created_at);
    let minutes = diff.div_euclid(MINUTE_MS);
    let hours = diff.div_euclid(HOUR_MS);
    let days = diff.div_euclid(DAY_MS);

    if minutes < 1 {
        "Just now".to_owned()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        OffsetDateTime::from_unix_timestamp(created_at.div_euclid(1000))
            .map(|dt| dt.date().to_string())
            .unwrap_or_default()
    }
}

/// Current wall-clock time in unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
