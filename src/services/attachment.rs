//! Attachment validation for document uploads.

use serde::Serialize;

pub const MAX_ATTACHMENTS: usize = 5;
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

const ACCEPTED_EXTENSIONS: &[&str] = &[".doc", ".docx", ".txt"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    #[error("too many files (max {max})")]
    TooMany { max: usize },
    #[error("file {name} exceeds max size of {max} bytes")]
    TooLarge { name: String, max: usize },
    #[error("unsupported file type: {name}")]
    UnsupportedType { name: String },
    #[error("Please upload a PDF, DOC, or TXT file")]
    NotADocument { name: String },
    #[error("no file provided")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Document,
    Other,
}

/// Document formats the document store ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Doc,
    Docx,
    Txt,
}

impl DocumentType {
    /// Detect from the file name's extension, case-insensitively.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Txt => "txt",
        }
    }
}

/// A document accepted by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedDocument {
    pub name: String,
    pub file_type: DocumentType,
    pub size: usize,
    pub size_label: String,
}

impl UploadedDocument {
    #[must_use]
    pub fn new(name: impl Into<String>, file_type: DocumentType, size: usize) -> Self {
        Self { name: name.into(), file_type, size, size_label: size_label(size) }
    }
}

#[must_use]
pub fn classify(content_type: &str, file_name: &str) -> AttachmentKind {
    if content_type.starts_with("image/") {
        AttachmentKind::Image
    } else if content_type == "application/pdf" || file_name.ends_with(".pdf") {
        AttachmentKind::Document
    } else {
        AttachmentKind::Other
    }
}

/// Accepted picker types: `image/*`, `application/pdf`, `.doc`, `.docx`, `.txt`.
#[must_use]
pub fn is_accepted(content_type: &str, file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    content_type.starts_with("image/")
        || content_type == "application/pdf"
        || ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Validate one uploaded document, returning its detected type.
pub fn validate_document(file_name: &str, content_type: &str, size: usize) -> Result<DocumentType, AttachmentError> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(AttachmentError::TooLarge { name: file_name.to_owned(), max: MAX_ATTACHMENT_BYTES });
    }
    if !is_accepted(content_type, file_name) {
        return Err(AttachmentError::UnsupportedType { name: file_name.to_owned() });
    }
    DocumentType::from_file_name(file_name).ok_or_else(|| AttachmentError::NotADocument { name: file_name.to_owned() })
}

/// Enforce the per-request file count. `count` is the number seen so far,
/// including the one about to be added.
pub fn check_count(count: usize) -> Result<(), AttachmentError> {
    if count > MAX_ATTACHMENTS {
        return Err(AttachmentError::TooMany { max: MAX_ATTACHMENTS });
    }
    Ok(())
}

/// Size label, e.g. `"12.3 KB"`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn size_label(bytes: usize) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

#[cfg(test)]
#[path = "attachment_test.rs"]
mod tests;
