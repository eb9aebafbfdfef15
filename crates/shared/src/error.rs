//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed request (unreadable body, missing multipart field).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request payload exceeds a configured ceiling.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Request payload has a media type the service does not accept.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Stored content could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Object storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::BadRequest(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::UnsupportedMediaType(_) => 415,
            Self::Decode(_) | Self::Database(_) | Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::BadRequest(_) => "bad_request",
            Self::PayloadTooLarge(_) => "file_too_large",
            Self::UnsupportedMediaType(_) => "invalid_mime_type",
            Self::Decode(_) => "signature_decode_failed",
            Self::Database(_) => "database_error",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Returns true for failures caused by infrastructure rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Message safe to show to API clients.
    ///
    /// Infrastructure failures are reduced to a generic message; the full
    /// error is expected to be logged server-side.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::BadRequest(msg)
            | Self::PayloadTooLarge(msg)
            | Self::UnsupportedMediaType(msg) => msg.clone(),
            Self::Decode(_) => "Stored signature could not be decoded".to_string(),
            Self::Database(_) | Self::Storage(_) => "Server error".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
