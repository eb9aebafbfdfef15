//! Attachment types and data structures.

use bytes::Bytes;

use super::signature::ImageFormat;

/// Metadata of an inbound upload, known before its bytes are read.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Filename supplied by the client.
    pub original_name: Option<String>,
    /// Declared MIME type.
    pub content_type: String,
    /// Declared size in bytes, when the client sent one.
    pub declared_size: Option<u64>,
}

/// A file accepted by the gateway and written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    /// Storage key, usable as an attachment reference on a claim.
    pub path: String,
    /// Public URL, when storage is publicly served.
    pub url: Option<String>,
    /// Filename supplied by the client.
    pub original_name: Option<String>,
    /// Extension of the stored file.
    pub extension: String,
    /// Normalized MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// A signature materialized as an image file in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFile {
    /// Storage key of the image.
    pub path: String,
    /// Detected image format.
    pub format: ImageFormat,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// A signature ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct SignatureDownload {
    /// Image bytes.
    pub bytes: Bytes,
    /// MIME type of the image.
    pub content_type: &'static str,
    /// Filename offered to the client.
    pub filename: String,
}
