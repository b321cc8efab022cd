//! HTTP client for the inference service.
//!
//! Endpoints:
//! - `POST /api/chatkit/session/` → `{ client_secret }` (or `clientSecret`)
//! - `POST /api/chatkit/message` `{ message, session_id }` → `{ response | message }`
//! - `POST /chat` `{ messages }` → `{ message | response }`

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{BackendError, ChatBackend, WireMessage, body_excerpt};
use crate::config::HttpTimeouts;

pub const CHATKIT_FALLBACK_REPLY: &str = "Request processed";
pub const CHAT_FALLBACK_REPLY: &str = "I couldn't process that request. Please try again.";

pub struct HttpChatBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| BackendError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<String, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "backend request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::Response { status: status.as_u16(), body: body_excerpt(&text) });
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct ChatkitMessageRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [WireMessage],
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_chatkit_session(&self) -> Result<String, BackendError> {
        let text = self
            .post_json("/api/chatkit/session/", &serde_json::json!({}))
            .await?;
        parse_client_secret(&text)
    }

    async fn send_chatkit_message(&self, message: &str, session_id: &str) -> Result<String, BackendError> {
        let text = self
            .post_json("/api/chatkit/message", &ChatkitMessageRequest { message, session_id })
            .await?;
        parse_reply(&text, &["response", "message"], CHATKIT_FALLBACK_REPLY)
    }

    async fn send_chat(&self, messages: &[WireMessage]) -> Result<String, BackendError> {
        let text = self.post_json("/chat", &ChatRequest { messages }).await?;
        parse_reply(&text, &["message", "response"], CHAT_FALLBACK_REPLY)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

#[derive(Deserialize)]
struct SessionResponse {
    client_secret: Option<String>,
    #[serde(rename = "clientSecret")]
    client_secret_camel: Option<String>,
}

pub(crate) fn parse_client_secret(text: &str) -> Result<String, BackendError> {
    let parsed: SessionResponse = serde_json::from_str(text).map_err(|_| BackendError::InvalidJson)?;
    parsed
        .client_secret
        .or(parsed.client_secret_camel)
        .filter(|s| !s.is_empty())
        .ok_or(BackendError::MissingClientSecret)
}

/// First non-empty string among `keys`, else `fallback`.
pub(crate) fn parse_reply(text: &str, keys: &[&str], fallback: &str) -> Result<String, BackendError> {
    let value: Value = serde_json::from_str(text).map_err(|_| BackendError::InvalidJson)?;
    Ok(keys
        .iter()
        .find_map(|key| {
            value
                .get(*key)
                .and_then(Value::as_str)
                .filter(|reply| !reply.is_empty())
        })
        .unwrap_or(fallback)
        .to_owned())
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
