//! Claim types and data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use claimdesk_shared::ClaimId;
use serde::{Deserialize, Serialize};

/// Maximum signature payload length, in characters.
pub const MAX_SIGNATURE_LEN: usize = 1_000_000;

/// Lifecycle tag of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Submitted, nobody has looked at it yet.
    #[default]
    Unprocessed,
    /// Picked up by a case handler.
    InReview,
    /// Handled.
    Processed,
    /// Not pursued.
    Rejected,
}

impl ClaimStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Unprocessed,
        Self::InReview,
        Self::Processed,
        Self::Rejected,
    ];

    /// Convert to database string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unprocessed => "unprocessed",
            Self::InReview => "in_review",
            Self::Processed => "processed",
            Self::Rejected => "rejected",
        }
    }

    /// Parse from database string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unprocessed" => Some(Self::Unprocessed),
            "in_review" => Some(Self::InReview),
            "processed" => Some(Self::Processed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named slots of stored-file references attached to a claim.
///
/// Slots are open-ended (`photo`, `tickets`, `id_cards`, ...) so records
/// written by older and newer form versions share one shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRefs(BTreeMap<String, Vec<String>>);

impl AttachmentRefs {
    /// Creates an empty set of references.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reference to a slot, creating the slot when needed.
    pub fn push(&mut self, slot: impl Into<String>, reference: impl Into<String>) {
        self.0.entry(slot.into()).or_default().push(reference.into());
    }

    /// Replaces the references held by a slot.
    pub fn set(&mut self, slot: impl Into<String>, references: Vec<String>) {
        self.0.insert(slot.into(), references);
    }

    /// References stored in a slot.
    #[must_use]
    pub fn get(&self, slot: &str) -> Option<&[String]> {
        self.0.get(slot).map(Vec::as_slice)
    }

    /// First reference stored in a slot.
    #[must_use]
    pub fn first(&self, slot: &str) -> Option<&str> {
        self.get(slot).and_then(<[String]>::first).map(String::as_str)
    }

    /// Overwrites the slots present in `other`, leaving the rest untouched.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Returns true when no slot is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(slot, references)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl From<BTreeMap<String, Vec<String>>> for AttachmentRefs {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// Raw claim form as received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct ClaimForm {
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Claimant full name.
    pub full_name: Option<String>,
    /// Flight number.
    pub flight_number: Option<String>,
    /// Airline booking reference.
    pub booking_reference: Option<String>,
    /// Flight date (`YYYY-MM-DD` or RFC 3339).
    pub flight_date: Option<String>,
    /// Claim case number.
    pub case_number: Option<String>,
    /// Base64 signature payload.
    pub signature: Option<String>,
    /// Already-uploaded attachment references.
    pub attachments: AttachmentRefs,
}

/// Validated input for creating a claim record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    /// Generated identifier.
    pub id: ClaimId,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Claimant full name.
    pub full_name: String,
    /// Flight number.
    pub flight_number: String,
    /// Airline booking reference.
    pub booking_reference: String,
    /// Flight date.
    pub flight_date: NaiveDate,
    /// Claim case number.
    pub case_number: String,
    /// Base64 signature payload.
    pub signature: String,
    /// Attachment references.
    pub attachments: AttachmentRefs,
    /// Initial status.
    pub status: ClaimStatus,
}

/// Raw partial update as received from a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct ClaimPatch {
    /// New contact email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New full name.
    pub full_name: Option<String>,
    /// New flight number.
    pub flight_number: Option<String>,
    /// New booking reference.
    pub booking_reference: Option<String>,
    /// New flight date.
    pub flight_date: Option<String>,
    /// New case number.
    pub case_number: Option<String>,
    /// New signature payload.
    pub signature: Option<String>,
    /// Attachment slots to replace.
    pub attachments: Option<AttachmentRefs>,
    /// New status.
    pub status: Option<String>,
}

/// Validated field-level changes for an existing claim.
///
/// `None` means "leave the stored value as it is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimChanges {
    /// New contact email.
    pub email: Option<String>,
    /// New phone number.
    pub phone: Option<String>,
    /// New full name.
    pub full_name: Option<String>,
    /// New flight number.
    pub flight_number: Option<String>,
    /// New booking reference.
    pub booking_reference: Option<String>,
    /// New flight date.
    pub flight_date: Option<NaiveDate>,
    /// New case number.
    pub case_number: Option<String>,
    /// New signature payload.
    pub signature: Option<String>,
    /// Attachment slots to replace.
    pub attachments: Option<AttachmentRefs>,
    /// New status.
    pub status: Option<ClaimStatus>,
}

impl ClaimChanges {
    /// Returns true when no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges these changes into a record, touching only supplied fields.
    pub fn apply_to(self, record: &mut ClaimRecord) {
        if let Some(email) = self.email {
            record.email = email;
        }
        if let Some(phone) = self.phone {
            record.phone = phone;
        }
        if let Some(full_name) = self.full_name {
            record.full_name = full_name;
        }
        if let Some(flight_number) = self.flight_number {
            record.flight_number = flight_number;
        }
        if let Some(booking_reference) = self.booking_reference {
            record.booking_reference = booking_reference;
        }
        if let Some(flight_date) = self.flight_date {
            record.flight_date = flight_date;
        }
        if let Some(case_number) = self.case_number {
            record.case_number = case_number;
        }
        if let Some(signature) = self.signature {
            record.signature = signature;
        }
        if let Some(attachments) = self.attachments {
            record.attachments.merge(attachments);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
    }
}

/// Persisted claim record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    /// Unique identifier.
    pub id: ClaimId,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Claimant full name.
    pub full_name: String,
    /// Flight number.
    pub flight_number: String,
    /// Airline booking reference.
    pub booking_reference: String,
    /// Flight date.
    pub flight_date: NaiveDate,
    /// Claim case number.
    pub case_number: String,
    /// Base64 signature payload.
    pub signature: String,
    /// Attachment references.
    pub attachments: AttachmentRefs,
    /// Lifecycle status.
    pub status: ClaimStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ClaimRecord {
    /// Builds a record from validated input, stamped with `now`.
    #[must_use]
    pub fn from_new(claim: NewClaim, now: DateTime<Utc>) -> Self {
        Self {
            id: claim.id,
            email: claim.email,
            phone: claim.phone,
            full_name: claim.full_name,
            flight_number: claim.flight_number,
            booking_reference: claim.booking_reference,
            flight_date: claim.flight_date,
            case_number: claim.case_number,
            signature: claim.signature,
            attachments: claim.attachments,
            status: claim.status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_status_roundtrip() {
        for status in ClaimStatus::ALL {
            assert_eq!(ClaimStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_claim_status_default_and_unknown() {
        assert_eq!(ClaimStatus::default(), ClaimStatus::Unprocessed);
        assert_eq!(ClaimStatus::parse("archived"), None);
        assert_eq!(ClaimStatus::parse("Processed"), None);
    }

    #[test]
    fn test_attachment_refs_merge_replaces_only_supplied_slots() {
        let mut refs = AttachmentRefs::new();
        refs.push("photo", "uploads/a.png");
        refs.push("tickets", "uploads/t1.png");

        let mut patch = AttachmentRefs::new();
        patch.set("tickets", vec!["uploads/t2.png".to_string()]);
        patch.push("id_cards", "uploads/id.png");
        refs.merge(patch);

        assert_eq!(refs.first("photo"), Some("uploads/a.png"));
        assert_eq!(refs.get("tickets"), Some(&["uploads/t2.png".to_string()][..]));
        assert_eq!(refs.first("id_cards"), Some("uploads/id.png"));
    }

    #[test]
    fn test_attachment_refs_serialize_as_map() {
        let mut refs = AttachmentRefs::new();
        refs.push("photo", "uploads/a.png");
        let json = serde_json::to_value(&refs).unwrap();
        assert_eq!(json, serde_json::json!({ "photo": ["uploads/a.png"] }));
    }

    #[test]
    fn test_empty_changes() {
        assert!(ClaimChanges::default().is_empty());
        let changes = ClaimChanges {
            status: Some(ClaimStatus::Processed),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
