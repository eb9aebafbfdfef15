//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for claim intake, review and attachments
//! - The boundary middleware stack (tracing, CORS, security headers, limits)
//! - Mapping of domain errors to HTTP responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use claimdesk_core::attachment::AttachmentService;
use claimdesk_core::claim::{ClaimRepository, ClaimService};
use claimdesk_core::storage::StorageService;
use claimdesk_shared::AppConfig;

pub use error::ApiError;

/// Application state shared across handlers.
///
/// Generic over the claim store so the server can run on Postgres while
/// tests inject an in-memory store.
pub struct AppState<R: ClaimRepository> {
    /// Claim submission and review.
    pub claims: Arc<ClaimService<R>>,
    /// Uploads and signature files.
    pub attachments: Arc<AttachmentService<R>>,
}

impl<R: ClaimRepository> AppState<R> {
    /// Wire the services around one store and one object storage.
    #[must_use]
    pub fn new(repo: Arc<R>, storage: Arc<StorageService>) -> Self {
        Self {
            claims: Arc::new(ClaimService::new(Arc::clone(&repo))),
            attachments: Arc::new(AttachmentService::new(storage, repo)),
        }
    }
}

impl<R: ClaimRepository> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            claims: Arc::clone(&self.claims),
            attachments: Arc::clone(&self.attachments),
        }
    }
}

/// Creates the main application router.
pub fn create_router<R: ClaimRepository + 'static>(state: AppState<R>, config: &AppConfig) -> Router {
    let router = routes::api_routes::<R>()
        .fallback(routes::not_found)
        .with_state(state);

    middleware::apply(router, config)
}
