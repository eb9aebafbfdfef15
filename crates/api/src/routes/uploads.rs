//! Upload and signature download routes.

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use claimdesk_core::attachment::{StoredAttachment, UploadInput};
use claimdesk_core::claim::ClaimRepository;
use serde::Serialize;
use tracing::info;

use super::parse_claim_id;
use crate::{ApiError, AppState};

/// Multipart field carrying the uploaded file.
const PHOTO_FIELD: &str = "photo";

/// Creates the upload routes.
pub fn routes<R: ClaimRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .route("/upload-photo", post(upload_photo::<R>))
        .route("/download-signature/{id}", get(download_signature::<R>))
}

/// Response for a stored upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Storage key, to be sent back as an attachment reference.
    pub path: String,
    /// Public URL, when storage is publicly served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Client filename.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Stored extension.
    pub extension: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

impl From<StoredAttachment> for UploadResponse {
    fn from(stored: StoredAttachment) -> Self {
        Self {
            path: stored.path,
            url: stored.url,
            original_name: stored.original_name,
            extension: stored.extension,
            mime_type: stored.mime_type,
            size_bytes: stored.size_bytes,
        }
    }
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(claimdesk_shared::AppError::PayloadTooLarge(err.body_text()))
    } else {
        ApiError::bad_request(err.body_text())
    }
}

/// POST `/upload-photo`
/// Store the image sent in the `photo` multipart field.
async fn upload_photo<R: ClaimRepository>(
    State(state): State<AppState<R>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let input = UploadInput {
            original_name: field.file_name().map(str::to_string),
            content_type: field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            declared_size: field
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        };

        let stored = state.attachments.accept_upload(input, field).await?;
        info!(path = %stored.path, size_bytes = stored.size_bytes, "Photo uploaded");

        return Ok((StatusCode::CREATED, Json(stored.into())));
    }

    Err(ApiError::bad_request(format!(
        "Multipart field '{PHOTO_FIELD}' is required"
    )))
}

/// GET `/download-signature/{id}`
/// Send the claim's signature as an image file.
///
/// Canvas signatures are PNG and go out as `image/png` / `signature.png`.
/// A signature stored as JPEG, GIF or WebP keeps its own type and extension
/// (`signature.jpg`, ...), since relabelling the bytes as PNG would corrupt them.
async fn download_signature<R: ClaimRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_claim_id(&id)?;
    let download = state.attachments.serve_signature(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", download.filename),
            ),
        ],
        download.bytes,
    )
        .into_response())
}
