//! API route definitions.

use axum::Router;
use claimdesk_core::claim::ClaimRepository;
use claimdesk_shared::ClaimId;

use crate::{ApiError, AppState};

pub mod claims;
pub mod health;
pub mod uploads;

/// Creates the API router with all routes.
pub fn api_routes<R: ClaimRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .merge(health::routes())
        .merge(claims::routes())
        .merge(uploads::routes())
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Parse a claim id from a path segment. Malformed ids name no claim.
pub(crate) fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    raw.parse::<ClaimId>().map_err(|_| ApiError::not_found("Claim not found"))
}
