use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use crate::api::gateway::{ApplicationGateway, GatewayError};
use crate::models::state::UploadedDocument;

/// Hard ceiling on document size. Checked before any bytes leave the machine.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types the backend accepts for supporting documents.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Error raised while preparing or uploading a supporting document.
/// The Display form is safe to show next to the document slot.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("This document is not part of the current application.")]
    UnknownDocument { key: String },
    #[error("File exceeds the 5 MB limit.")]
    TooLarge { size: u64 },
    #[error("Only JPEG, PNG, or PDF files are accepted.")]
    UnsupportedType { mime_type: String },
    #[error("Could not read the selected file. Please pick it again.")]
    Unreadable { detail: String },
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

/// A document read from disk, ready for preflight checks.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    /// Load a document from `path`, inferring the MIME type from the
    /// extension. The size ceiling is checked against file metadata before
    /// the contents are read.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());
        let mime_type = mime_type_for(path);

        let metadata = std::fs::metadata(path).map_err(|e| UploadError::Unreadable {
            detail: format!("Metadata read failed for {}: {}", path.display(), e),
        })?;
        if metadata.len() > MAX_DOCUMENT_BYTES {
            return Err(UploadError::TooLarge {
                size: metadata.len(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| UploadError::Unreadable {
            detail: format!("Read failed for {}: {}", path.display(), e),
        })?;
        Ok(Self {
            file_name,
            mime_type,
            bytes,
        })
    }

    /// Run the preflight checks the backend would also enforce.
    pub fn validate(&self) -> Result<(), UploadError> {
        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(UploadError::UnsupportedType {
                mime_type: self.mime_type.clone(),
            });
        }
        if self.bytes.len() as u64 > MAX_DOCUMENT_BYTES {
            return Err(UploadError::TooLarge {
                size: self.bytes.len() as u64,
            });
        }
        Ok(())
    }
}

fn mime_type_for(path: &Path) -> String {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        other => {
            warn!(
                "[PHASE: document_upload] [STEP: preflight] Unrecognized extension: {}",
                other
            );
            "application/octet-stream"
        }
    }
    .to_string()
}

/// Upload a validated document through the gateway.
/// Preflight failures return before any network call is made.
pub async fn upload_document(
    gateway: &dyn ApplicationGateway,
    file: DocumentFile,
) -> Result<UploadedDocument, UploadError> {
    file.validate()?;

    info!(
        "[PHASE: document_upload] [STEP: send] Uploading {} ({} bytes, {})",
        file.file_name,
        file.bytes.len(),
        file.mime_type
    );
    let document = gateway
        .upload_document(&file.file_name, &file.mime_type, file.bytes)
        .await?;
    info!(
        "[PHASE: document_upload] [STEP: send] Stored as {}",
        document.path
    );
    Ok(document)
}
