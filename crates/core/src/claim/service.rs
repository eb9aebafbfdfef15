//! Claim service implementation.

use std::sync::Arc;

use claimdesk_shared::ClaimId;
use tracing::{error, info};

use super::error::ClaimError;
use super::types::{ClaimChanges, ClaimForm, ClaimPatch, ClaimRecord, NewClaim};
use super::validation::{validate_changes, validate_submission};

/// Repository trait for claim persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
/// Implementations must be safe to share between concurrent requests.
pub trait ClaimRepository: Send + Sync {
    /// Persist a new claim record.
    fn create(
        &self,
        claim: NewClaim,
    ) -> impl std::future::Future<Output = Result<ClaimRecord, ClaimError>> + Send;

    /// List all claims in storage-defined order.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<ClaimRecord>, ClaimError>> + Send;

    /// Find claim by ID.
    fn find_by_id(
        &self,
        id: ClaimId,
    ) -> impl std::future::Future<Output = Result<Option<ClaimRecord>, ClaimError>> + Send;

    /// Merge changes into an existing claim.
    ///
    /// Returns `None` when no claim with `id` exists. An empty change set on
    /// an existing claim returns the stored record unchanged.
    fn update(
        &self,
        id: ClaimId,
        changes: ClaimChanges,
    ) -> impl std::future::Future<Output = Result<Option<ClaimRecord>, ClaimError>> + Send;
}

/// Claim service for submitting, reading and updating claims.
pub struct ClaimService<R: ClaimRepository> {
    repo: Arc<R>,
}

impl<R: ClaimRepository> ClaimService<R> {
    /// Create a new claim service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// The underlying record store.
    #[must_use]
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Validate a form and store it as a new claim.
    ///
    /// Nothing is written when validation fails.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required field is missing or blank
    /// - The flight date cannot be parsed
    /// - The signature exceeds its size bound
    /// - The repository write fails
    pub async fn submit(&self, form: ClaimForm) -> Result<ClaimRecord, ClaimError> {
        let claim = validate_submission(form)?;
        let claim_id = claim.id;

        match self.repo.create(claim).await {
            Ok(record) => {
                info!(claim_id = %record.id, "Claim submitted");
                Ok(record)
            }
            Err(e) => {
                error!(claim_id = %claim_id, error = %e, "Failed to store claim");
                Err(e)
            }
        }
    }

    /// List all claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository read fails.
    pub async fn list(&self) -> Result<Vec<ClaimRecord>, ClaimError> {
        self.repo
            .list_all()
            .await
            .inspect_err(|e| error!(error = %e, "Failed to list claims"))
    }

    /// Get claim by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim does not exist or the read fails.
    pub async fn get_by_id(&self, id: ClaimId) -> Result<ClaimRecord, ClaimError> {
        self.repo
            .find_by_id(id)
            .await
            .inspect_err(|e| error!(claim_id = %id, error = %e, "Failed to load claim"))?
            .ok_or_else(|| ClaimError::not_found(id))
    }

    /// Apply a partial update to an existing claim.
    ///
    /// Only supplied fields change. Updating an existing claim with no
    /// fields succeeds and returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A supplied field is invalid
    /// - The claim does not exist
    /// - The repository write fails
    pub async fn update(&self, id: ClaimId, patch: ClaimPatch) -> Result<ClaimRecord, ClaimError> {
        let changes = validate_changes(patch)?;

        let record = self
            .repo
            .update(id, changes)
            .await
            .inspect_err(|e| error!(claim_id = %id, error = %e, "Failed to update claim"))?
            .ok_or_else(|| ClaimError::not_found(id))?;

        info!(claim_id = %id, status = %record.status, "Claim updated");
        Ok(record)
    }
}
