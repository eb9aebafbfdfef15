//! Claim error types.

use claimdesk_shared::ClaimId;
use thiserror::Error;

/// A single violated constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// Field is absent.
    #[error("is required")]
    Missing,

    /// Field is present but empty or whitespace only.
    #[error("must not be empty")]
    Blank,

    /// Field is not a recognizable calendar date.
    #[error("is not a valid date: {0:?}")]
    InvalidDate(String),

    /// Field exceeds its length bound.
    #[error("is too long: {actual} characters exceeds maximum {max}")]
    TooLong {
        /// Actual length.
        actual: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// Status value is not part of the vocabulary.
    #[error("unknown status {0:?}")]
    UnknownStatus(String),

    /// Attachment slot name is malformed.
    #[error("invalid attachment slot name {0:?}")]
    InvalidSlot(String),

    /// Attachment slot contains an empty reference.
    #[error("slot {0:?} contains an empty reference")]
    BlankReference(String),
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub violation: Violation,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.violation)
    }
}

/// Every constraint violated by one submission or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldViolation>);

impl ValidationErrors {
    /// Records a violation.
    pub fn add(&mut self, field: &'static str, violation: Violation) {
        self.0.push(FieldViolation { field, violation });
    }

    /// Returns true when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded violations, in field order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Returns true when `field` has at least one violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// `Ok(())` when empty, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Claim operation errors.
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Input violates one or more constraints.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Claim not found.
    #[error("claim not found: {0}")]
    NotFound(ClaimId),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl ClaimError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: ClaimId) -> Self {
        Self::NotFound(id)
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
