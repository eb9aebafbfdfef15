//! Attachment gateway for claim files.
//!
//! This module provides business logic for claim attachments including:
//! - Image upload validation (media type, size ceiling)
//! - Collision-resistant storage of uploaded files
//! - Lazy materialization of base64 signatures into image files
//! - Signature download

mod error;
mod service;
pub mod signature;
mod types;

pub use error::AttachmentError;
pub use service::AttachmentService;
pub use signature::{DecodedSignature, ImageFormat, SignatureError, decode_signature};
pub use types::{SignatureDownload, SignatureFile, StoredAttachment, UploadInput};
