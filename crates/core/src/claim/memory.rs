//! In-process claim store backed by a concurrent map.

use chrono::Utc;
use claimdesk_shared::ClaimId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::error::ClaimError;
use super::service::ClaimRepository;
use super::types::{ClaimChanges, ClaimRecord, NewClaim};

/// Claim store that keeps records in memory.
///
/// Each instance is isolated; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryClaimRepository {
    claims: DashMap<ClaimId, ClaimRecord>,
}

impl InMemoryClaimRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Returns true when no claim is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

impl ClaimRepository for InMemoryClaimRepository {
    async fn create(&self, claim: NewClaim) -> Result<ClaimRecord, ClaimError> {
        let record = ClaimRecord::from_new(claim, Utc::now());
        match self.claims.entry(record.id) {
            Entry::Occupied(_) => Err(ClaimError::repository(format!(
                "duplicate claim id {}",
                record.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<ClaimRecord>, ClaimError> {
        Ok(self.claims.iter().map(|entry| entry.value().clone()).collect())
    }

    async fn find_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ClaimError> {
        Ok(self.claims.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(
        &self,
        id: ClaimId,
        changes: ClaimChanges,
    ) -> Result<Option<ClaimRecord>, ClaimError> {
        let Some(mut entry) = self.claims.get_mut(&id) else {
            return Ok(None);
        };
        if !changes.is_empty() {
            changes.apply_to(entry.value_mut());
            entry.updated_at = Utc::now();
        }
        Ok(Some(entry.value().clone()))
    }
}
