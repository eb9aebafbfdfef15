//! Attachment error types.

use claimdesk_shared::ClaimId;
use thiserror::Error;

use super::signature::SignatureError;
use crate::claim::ClaimError;
use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// Declared media type is not an accepted image type.
    #[error("unsupported media type '{0}': only image uploads are accepted")]
    UnsupportedMediaType(String),

    /// File too large.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Bytes seen (or declared) when the upload was rejected.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Upload contained no bytes.
    #[error("uploaded file is empty")]
    EmptyUpload,

    /// The client stream failed while reading the upload.
    #[error("failed to read upload: {0}")]
    Read(String),

    /// Claim not found.
    #[error("claim not found: {0}")]
    ClaimNotFound(ClaimId),

    /// Stored signature could not be decoded into an image.
    #[error("signature decode failed: {0}")]
    Decode(#[from] SignatureError),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }
}

impl From<ClaimError> for AttachmentError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::NotFound(id) => Self::ClaimNotFound(id),
            other => Self::Repository(other.to_string()),
        }
    }
}
