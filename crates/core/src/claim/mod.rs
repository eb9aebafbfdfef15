//! Claim records and the submission pipeline.
//!
//! This module provides business logic for claim forms including:
//! - Submission validation and record assembly
//! - The record store contract implemented by the db crate
//! - An in-process record store for tests and local runs
//! - Partial updates with field-level merge

mod error;
mod memory;
mod service;
mod types;
mod validation;

pub use error::{ClaimError, FieldViolation, ValidationErrors, Violation};
pub use memory::InMemoryClaimRepository;
pub use service::{ClaimRepository, ClaimService};
pub use types::{
    AttachmentRefs, ClaimChanges, ClaimForm, ClaimPatch, ClaimRecord, ClaimStatus,
    MAX_SIGNATURE_LEN, NewClaim,
};
pub use validation::{parse_flight_date, validate_changes, validate_submission};
