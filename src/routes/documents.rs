//! Document routes — uploads and vector queries forwarded to the document store.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use tracing::{debug, info, warn};

use super::auth::AuthUser;
use super::error_response;
use crate::backend::documents::{DocumentError, DocumentsClient, FileUpload, TextUpload, VectorQuery};
use crate::services::attachment::{self, AttachmentError, DocumentType, UploadedDocument};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const DEFAULT_UPLOAD_NAME: &str = "upload";

pub(crate) fn document_error_to_status(err: &DocumentError) -> StatusCode {
    match err {
        DocumentError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
        DocumentError::Request(_) | DocumentError::Response { .. } | DocumentError::InvalidJson => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn document_error_response(err: &DocumentError) -> Response {
    warn!(error = %err, "documents: upstream call failed");
    error_response(document_error_to_status(err), err.to_string())
}

fn attachment_error_response(err: &AttachmentError) -> Response {
    let status = match err {
        AttachmentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AttachmentError::TooMany { .. }
        | AttachmentError::UnsupportedType { .. }
        | AttachmentError::NotADocument { .. }
        | AttachmentError::Empty => StatusCode::BAD_REQUEST,
    };
    error_response(status, err.to_string())
}

fn documents_client(state: &AppState) -> Result<Arc<DocumentsClient>, Response> {
    state
        .documents
        .clone()
        .ok_or_else(|| error_response(StatusCode::SERVICE_UNAVAILABLE, "Document store not configured"))
}

// =============================================================================
// MULTIPART
// =============================================================================

/// Read and validate every `file` part of an upload form.
async fn read_uploads(multipart: &mut Multipart) -> Result<Vec<(FileUpload, DocumentType)>, Response> {
    let mut files = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(error_response(e.status(), e.body_text())),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        attachment::check_count(files.len() + 1).map_err(|e| attachment_error_response(&e))?;

        let file_name = field.file_name().unwrap_or(DEFAULT_UPLOAD_NAME).to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_response(e.status(), e.body_text()))?;

        let declared = content_type.as_deref().unwrap_or_default();
        let document_type =
            attachment::validate_document(&file_name, declared, bytes.len()).map_err(|e| attachment_error_response(&e))?;
        debug!(file = %file_name, kind = ?attachment::classify(declared, &file_name), "documents: accepted part");

        files.push((
            FileUpload {
                file_name,
                content_type,
                file_type: document_type.as_str().to_owned(),
                bytes: bytes.to_vec(),
            },
            document_type,
        ));
    }
    Ok(files)
}

// =============================================================================
// HANDLERS
// =============================================================================

/// `POST /api/documents/upload` — forward each `file` part to the document store.
pub async fn upload_documents(State(state): State<AppState>, auth: AuthUser, mut multipart: Multipart) -> Response {
    let client = match documents_client(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    let files = match read_uploads(&mut multipart).await {
        Ok(files) => files,
        Err(response) => return response,
    };
    if files.is_empty() {
        return attachment_error_response(&AttachmentError::Empty);
    }

    let mut uploaded = Vec::with_capacity(files.len());
    for (upload, document_type) in files {
        let name = upload.file_name.clone();
        let size = upload.bytes.len();
        if let Err(e) = client.upload_file(&auth.access_token, upload).await {
            return document_error_response(&e);
        }
        info!(user_id = %auth.user.id, file = %name, size, "documents: uploaded");
        uploaded.push(UploadedDocument::new(name, document_type, size));
    }
    Json(uploaded).into_response()
}

/// `POST /api/documents/text` — store plain text as a document.
pub async fn upload_text(State(state): State<AppState>, auth: AuthUser, Json(body): Json<TextUpload>) -> Response {
    let client = match documents_client(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    if body.text.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Text is required");
    }
    match client.upload_text(&auth.access_token, body).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => document_error_response(&e),
    }
}

/// `POST /api/vector/query` — similarity search over the user's documents.
pub async fn query_vectors(State(state): State<AppState>, auth: AuthUser, Json(body): Json<VectorQuery>) -> Response {
    let client = match documents_client(&state) {
        Ok(client) => client,
        Err(response) => return response,
    };
    if body.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Query is required");
    }
    match client.query_vector(&auth.access_token, &body).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => document_error_response(&e),
    }
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
