//! Document store client: uploads and vector queries.
//!
//! Requests are made on behalf of the signed-in user and carry their access
//! token as a bearer credential; the document store verifies it with the
//! same auth provider.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::HttpTimeouts;

pub const DEFAULT_TOP_K: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document store request failed: {0}")]
    Request(String),
    #[error("Request failed {status}: {body}")]
    Response { status: u16, body: String },
    #[error("document store returned invalid JSON")]
    InvalidJson,
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

/// A file forwarded to the document store.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub file_type: String,
    pub bytes: Vec<u8>,
}

/// Plain text forwarded to the document store.
#[derive(Debug, Clone, Deserialize)]
pub struct TextUpload {
    pub text: String,
    #[serde(default = "default_text_file_type")]
    pub file_type: String,
    #[serde(default)]
    pub filename: Option<String>,
}

fn default_text_file_type() -> String {
    "txt".to_owned()
}

/// Similarity query against uploaded documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorQuery {
    pub query: String,
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: u32,
    #[serde(default)]
    pub filters: Value,
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

pub struct DocumentsClient {
    http: reqwest::Client,
    base_url: String,
}

impl DocumentsClient {
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, DocumentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| DocumentError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    /// `POST /documents/upload` with multipart `{ file, file_type, title }`.
    pub async fn upload_file(&self, access_token: &str, upload: FileUpload) -> Result<Value, DocumentError> {
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        if let Some(content_type) = upload.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| DocumentError::Request(e.to_string()))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("file_type", upload.file_type)
            .text("title", upload.file_name);
        self.send(access_token, "/documents/upload", RequestBody::Multipart(form))
            .await
    }

    /// `POST /documents/upload` with multipart `{ text, file_type, filename? }`.
    pub async fn upload_text(&self, access_token: &str, upload: TextUpload) -> Result<Value, DocumentError> {
        let mut form = Form::new()
            .text("text", upload.text)
            .text("file_type", upload.file_type);
        if let Some(filename) = upload.filename {
            form = form.text("filename", filename);
        }
        self.send(access_token, "/documents/upload", RequestBody::Multipart(form))
            .await
    }

    /// `POST /vector/query` with JSON `{ query, topK, filters }`.
    pub async fn query_vector(&self, access_token: &str, query: &VectorQuery) -> Result<Value, DocumentError> {
        let body = serde_json::to_value(query).map_err(|_| DocumentError::InvalidJson)?;
        self.send(access_token, "/vector/query", RequestBody::Json(body))
            .await
    }

    async fn send(&self, access_token: &str, path: &str, body: RequestBody) -> Result<Value, DocumentError> {
        let request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(access_token);
        let request = match body {
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };
        let response = request
            .send()
            .await
            .map_err(|e| DocumentError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DocumentError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(DocumentError::Response { status: status.as_u16(), body: text });
        }
        serde_json::from_str(&text).map_err(|_| DocumentError::InvalidJson)
    }
}

enum RequestBody {
    Json(Value),
    Multipart(Form),
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
