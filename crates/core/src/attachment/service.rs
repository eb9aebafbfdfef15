//! Attachment service implementation.

use std::pin::pin;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use claimdesk_shared::ClaimId;
use futures::{Stream, StreamExt};
use tracing::{error, info, warn};

use super::error::AttachmentError;
use super::signature::{DecodedSignature, decode_signature};
use super::types::{SignatureDownload, SignatureFile, StoredAttachment, UploadInput};
use crate::claim::ClaimRepository;
use crate::storage::{StorageService, normalize_mime_type};

/// Gateway for uploaded claim files and signature images.
pub struct AttachmentService<R: ClaimRepository> {
    storage: Arc<StorageService>,
    repo: Arc<R>,
}

impl<R: ClaimRepository> AttachmentService<R> {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<StorageService> {
        &self.storage
    }

    /// Check an upload's declared metadata before any byte is read.
    ///
    /// # Errors
    ///
    /// Returns an error if the media type is not an accepted image type or
    /// the declared size is over the ceiling.
    pub fn check_upload(&self, input: &UploadInput) -> Result<(), AttachmentError> {
        let config = self.storage.config();

        if !config.is_mime_type_allowed(&input.content_type) {
            return Err(AttachmentError::UnsupportedMediaType(input.content_type.clone()));
        }

        match input.declared_size {
            Some(size) if size > config.max_file_size => {
                Err(AttachmentError::file_too_large(size, config.max_file_size))
            }
            _ => Ok(()),
        }
    }

    /// Accept one uploaded file and store it under a fresh key.
    ///
    /// The body is read while counting bytes and abandoned as soon as it
    /// crosses the size ceiling. Nothing reaches storage for a rejected upload.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The media type is not an accepted image type
    /// - The file is larger than the configured ceiling
    /// - The file is empty or the client stream fails
    /// - The storage write fails
    pub async fn accept_upload<S, E>(
        &self,
        input: UploadInput,
        body: S,
    ) -> Result<StoredAttachment, AttachmentError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        self.check_upload(&input)?;

        let data = match self.collect_within_limit(body).await {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    original_name = input.original_name.as_deref().unwrap_or_default(),
                    error = %e,
                    "Upload rejected"
                );
                return Err(e);
            }
        };
        if data.is_empty() {
            return Err(AttachmentError::EmptyUpload);
        }

        let mime_type = normalize_mime_type(&input.content_type);
        let key =
            StorageService::generate_upload_key(input.original_name.as_deref(), &mime_type, Utc::now());
        let stored = self.storage.write(&key, data, &mime_type).await.map_err(|e| {
            error!(key = %key, error = %e, "Failed to store upload");
            AttachmentError::from(e)
        })?;

        info!(
            key = %stored.key,
            size_bytes = stored.size_bytes,
            provider = self.storage.provider_name(),
            "Upload stored"
        );

        let extension = key.rsplit_once('.').map(|(_, ext)| ext.to_string()).unwrap_or_default();
        Ok(StoredAttachment {
            url: self.storage.public_url(&stored.key),
            path: stored.key,
            original_name: input.original_name,
            extension,
            mime_type,
            size_bytes: stored.size_bytes,
        })
    }

    /// Buffer a body, failing once it exceeds the size ceiling.
    async fn collect_within_limit<S, E>(&self, body: S) -> Result<Bytes, AttachmentError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::fmt::Display + Send,
    {
        let max = self.storage.config().max_file_size;
        let mut body = pin!(body);
        let mut buffer = BytesMut::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| AttachmentError::Read(e.to_string()))?;
            let size = u64::try_from(buffer.len() + chunk.len()).unwrap_or(u64::MAX);
            if size > max {
                return Err(AttachmentError::file_too_large(size, max));
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(buffer.freeze())
    }

    /// Materialize a signature payload as an image file.
    ///
    /// The key is derived from the image digest, so decoding the same
    /// payload again yields the same file. An existing file is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload does not decode to a supported image
    /// or the storage write fails. Nothing is written when decoding fails.
    pub async fn decode_signature_to_file(
        &self,
        payload: &str,
    ) -> Result<SignatureFile, AttachmentError> {
        let decoded = decode_signature(payload)?;
        self.materialize(&decoded).await
    }

    async fn materialize(
        &self,
        decoded: &DecodedSignature,
    ) -> Result<SignatureFile, AttachmentError> {
        let key = StorageService::signature_key(&decoded.digest_hex(), decoded.format.extension());
        let size_bytes = u64::try_from(decoded.bytes.len()).unwrap_or(u64::MAX);

        // Writes are atomic and the key is content-addressed: present means complete.
        if !self.storage.exists(&key).await {
            self.storage
                .write(&key, decoded.bytes.clone(), decoded.format.mime_type())
                .await?;
        }

        Ok(SignatureFile {
            path: key,
            format: decoded.format,
            size_bytes,
        })
    }

    /// Produce the signature image of a claim for download.
    ///
    /// The response carries the decoded bytes; the stored file is never
    /// read back, so concurrent downloads cannot observe each other's writes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The claim does not exist
    /// - Its signature cannot be decoded
    /// - Storage fails
    pub async fn serve_signature(&self, id: ClaimId) -> Result<SignatureDownload, AttachmentError> {
        let record = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(AttachmentError::ClaimNotFound(id))?;

        let decoded = decode_signature(&record.signature)
            .map_err(AttachmentError::from)
            .inspect_err(|e| error!(claim_id = %id, error = %e, "Failed to decode signature"))?;
        let file = self
            .materialize(&decoded)
            .await
            .inspect_err(|e| error!(claim_id = %id, error = %e, "Failed to store signature"))?;

        info!(claim_id = %id, key = %file.path, "Signature served");
        Ok(SignatureDownload {
            bytes: decoded.bytes,
            content_type: file.format.mime_type(),
            filename: format!("signature.{}", file.format.extension()),
        })
    }
}
