//! Streaming chat completions against an OpenAI-compatible API.
//!
//! The upstream answers with server-sent events; each `data:` line carries a
//! JSON chunk whose `choices[0].delta.content` is the next slice of text.
//! [`SseDecoder`] turns raw byte chunks (which may split lines anywhere) into
//! those text slices, and [`CompletionsClient::stream`] exposes them as a
//! stream of plain strings ready to be written to a `text/plain` body.

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use super::types::{WireMessage, body_excerpt};
use crate::config::{CompletionsConfig, HttpTimeouts};

pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(String),
    #[error("completion response error: status {status}: {body}")]
    Response { status: u16, body: String },
    #[error("completion stream interrupted: {0}")]
    Stream(String),
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

pub struct CompletionsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct StreamRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    stream: bool,
}

impl CompletionsClient {
    pub fn new(config: &CompletionsConfig, timeouts: HttpTimeouts) -> Result<Self, CompletionError> {
        // No overall timeout: a long answer keeps the stream open past it.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| CompletionError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streaming completion for `messages`.
    ///
    /// # Errors
    ///
    /// Fails before any text is produced when the request cannot be sent or
    /// the upstream answers with a non-success status.
    pub async fn stream(&self, messages: &[WireMessage]) -> Result<DeltaStream, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&StreamRequest { model: &self.model, messages, stream: true })
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Response { status: status.as_u16(), body: body_excerpt(&body) });
        }

        let deltas = response
            .bytes_stream()
            .scan(SseDecoder::default(), |decoder, chunk| {
                // Stop reading once `[DONE]` arrived, even if the upstream keeps the connection open.
                if decoder.is_done() {
                    return futures::future::ready(None);
                }
                let item = match chunk {
                    Ok(bytes) => Ok(decoder.push(&bytes).concat()),
                    Err(e) => Err(CompletionError::Stream(e.to_string())),
                };
                futures::future::ready(Some(item))
            })
            .filter(|item| futures::future::ready(!matches!(item, Ok(text) if text.is_empty())));
        Ok(Box::pin(deltas))
    }
}

// =============================================================================
// SSE DECODING
// =============================================================================

/// Incremental decoder for `data:` lines of an SSE body.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feed a raw chunk; return the text deltas of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if self.done {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            match decode_line(line.trim_end_matches(['\r', '\n'])) {
                SseLine::Delta(text) => out.push(text),
                SseLine::Done => self.done = true,
                SseLine::Skip => {}
            }
        }
        out
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Delta(String),
    Done,
    Skip,
}

fn decode_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    let Ok(value) = serde_json::from_str::<Value>(data) else {
        return SseLine::Skip;
    };
    value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map_or(SseLine::Skip, |text| SseLine::Delta(text.to_owned()))
}

#[cfg(test)]
#[path = "completions_test.rs"]
mod tests;
