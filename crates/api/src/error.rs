//! Mapping of domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use claimdesk_core::attachment::AttachmentError;
use claimdesk_core::claim::ClaimError;
use claimdesk_shared::AppError;
use serde_json::{Value, json};
use tracing::error;

/// Error returned by handlers.
///
/// Body: `{"error": <code>, "message": <text>, "details"?: ...}`. Server
/// errors carry a generic message; the cause goes to the log only.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    details: Option<Value>,
}

impl ApiError {
    /// Wrap an application error.
    #[must_use]
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            details: None,
        }
    }

    /// Attach structured details to the response body.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// 400 with a message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(AppError::BadRequest(message.into()))
    }

    /// 404 with a message.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AppError::NotFound(message.into()))
    }

    /// The wrapped error.
    #[must_use]
    pub fn inner(&self) -> &AppError {
        &self.error
    }
}

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self::new(error)
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Validation(errors) => {
                let details: Vec<Value> = errors
                    .violations()
                    .iter()
                    .map(|v| {
                        json!({
                            "field": camel_case(v.field),
                            "message": v.violation.to_string(),
                        })
                    })
                    .collect();
                Self::new(AppError::Validation(errors.to_string())).with_details(Value::Array(details))
            }
            ClaimError::NotFound(_) => Self::not_found("Claim not found"),
            ClaimError::Repository(msg) => Self::new(AppError::Database(msg)),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::UnsupportedMediaType(_) => {
                Self::new(AppError::UnsupportedMediaType(err.to_string()))
            }
            AttachmentError::FileTooLarge { max, .. } => {
                Self::new(AppError::PayloadTooLarge(format!(
                    "File too large: the maximum upload size is {max} bytes"
                )))
                .with_details(json!({ "maxBytes": max }))
            }
            AttachmentError::EmptyUpload | AttachmentError::Read(_) => {
                Self::bad_request(err.to_string())
            }
            AttachmentError::ClaimNotFound(_) => Self::not_found("Claim not found"),
            AttachmentError::Decode(e) => Self::new(AppError::Decode(e.to_string())),
            AttachmentError::Storage(e) => Self::new(AppError::Storage(e.to_string())),
            AttachmentError::Repository(msg) => Self::new(AppError::Database(msg)),
        }
    }
}

/// Field names on the wire are camelCase (`full_name` -> `fullName`).
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.error.is_server_error() {
            error!(code = self.error.error_code(), error = %self.error, "Request failed");
        }

        let mut body = json!({
            "error": self.error.error_code(),
            "message": self.error.public_message(),
        });
        if let (Some(details), Some(map)) = (self.details, body.as_object_mut()) {
            map.insert("details".to_string(), details);
        }

        (status, Json(body)).into_response()
    }
}
