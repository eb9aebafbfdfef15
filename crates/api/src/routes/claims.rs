//! Claim intake and review routes.
//!
//! Field names on the wire are camelCase. Older form versions send their
//! files as top-level fields (`photoUrl`, `tickets`, `ID_Cards`,
//! `Flight_delay_proof`); those are folded into the named attachment slots.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use claimdesk_core::claim::{
    AttachmentRefs, ClaimForm, ClaimPatch, ClaimRecord, ClaimRepository, ClaimStatus,
};
use claimdesk_shared::ClaimId;
use serde::{Deserialize, Serialize};

use super::parse_claim_id;
use crate::{ApiError, AppState};

/// Creates the claim routes.
pub fn routes<R: ClaimRepository + 'static>() -> Router<AppState<R>> {
    Router::new()
        .route("/submit-form", post(submit_form::<R>))
        .route("/api/customers", get(list_customers::<R>))
        .route(
            "/api/customers/{id}",
            get(get_customer::<R>).put(update_customer::<R>),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A single reference or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// One reference.
    One(String),
    /// Several references.
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

/// Attachment fields accepted on both submission and update.
#[derive(Debug, Default, Deserialize)]
pub struct AttachmentFields {
    /// Legacy photo reference.
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<OneOrMany>,
    /// Legacy ticket references.
    pub tickets: Option<OneOrMany>,
    /// Legacy identity card references.
    #[serde(rename = "ID_Cards")]
    pub id_cards: Option<OneOrMany>,
    /// Legacy flight delay proof references.
    #[serde(rename = "Flight_delay_proof")]
    pub flight_delay_proof: Option<OneOrMany>,
    /// Named slots.
    pub attachments: Option<BTreeMap<String, OneOrMany>>,
}

impl AttachmentFields {
    /// Fold legacy fields and the generic map into slots.
    ///
    /// Returns `None` when the request names no slot at all. Blank legacy
    /// values are what old forms send for "no file" and are skipped.
    fn into_refs(self) -> Option<AttachmentRefs> {
        let mut refs = AttachmentRefs::new();
        let mut any = false;

        for (slot, value) in self.attachments.unwrap_or_default() {
            refs.set(slot, value.into_vec());
            any = true;
        }

        let legacy = [
            ("photo", self.photo_url),
            ("tickets", self.tickets),
            ("id_cards", self.id_cards),
            ("flight_delay_proof", self.flight_delay_proof),
        ];
        for (slot, value) in legacy {
            let Some(value) = value else { continue };
            let references: Vec<String> = value
                .into_vec()
                .into_iter()
                .filter(|r| !r.trim().is_empty())
                .collect();
            if !references.is_empty() {
                refs.set(slot, references);
                any = true;
            }
        }

        any.then_some(refs)
    }
}

/// Request body for a claim submission.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimRequest {
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Claimant full name.
    pub full_name: Option<String>,
    /// Flight number.
    pub flight_number: Option<String>,
    /// Booking reference.
    pub booking_reference: Option<String>,
    /// Flight date.
    pub flight_date: Option<String>,
    /// Case number.
    pub case_number: Option<String>,
    /// Base64 signature.
    pub signature: Option<String>,
    /// Attachment references.
    #[serde(flatten)]
    pub files: AttachmentFields,
}

impl From<SubmitClaimRequest> for ClaimForm {
    fn from(req: SubmitClaimRequest) -> Self {
        Self {
            email: req.email,
            phone: req.phone,
            full_name: req.full_name,
            flight_number: req.flight_number,
            booking_reference: req.booking_reference,
            flight_date: req.flight_date,
            case_number: req.case_number,
            signature: req.signature,
            attachments: req.files.into_refs().unwrap_or_default(),
        }
    }
}

/// Request body for a partial claim update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimRequest {
    /// New contact email.
    pub email: Option<String>,
    /// New phone.
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
    /// New signature.
    pub signature: Option<String>,
    /// New status.
    pub status: Option<String>,
    /// Attachment slots to replace.
    #[serde(flatten)]
    pub files: AttachmentFields,
}

impl From<UpdateClaimRequest> for ClaimPatch {
    fn from(req: UpdateClaimRequest) -> Self {
        Self {
            email: req.email,
            phone: req.phone,
            full_name: req.full_name,
            flight_number: req.flight_number,
            booking_reference: req.booking_reference,
            flight_date: req.flight_date,
            case_number: req.case_number,
            signature: req.signature,
            attachments: req.files.into_refs(),
            status: req.status,
        }
    }
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// Confirmation text.
    pub message: &'static str,
    /// Identifier of the new claim.
    pub id: ClaimId,
}

/// A claim as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    /// Claim ID.
    pub id: ClaimId,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Claimant full name.
    pub full_name: String,
    /// Flight number.
    pub flight_number: String,
    /// Booking reference.
    pub booking_reference: String,
    /// Flight date.
    pub flight_date: NaiveDate,
    /// Case number.
    pub case_number: String,
    /// Base64 signature.
    pub signature: String,
    /// First photo reference, for older clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// All attachment slots.
    pub attachments: AttachmentRefs,
    /// Review status.
    pub status: ClaimStatus,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<ClaimRecord> for ClaimResponse {
    fn from(record: ClaimRecord) -> Self {
        Self {
            photo_url: record.attachments.first("photo").map(str::to_string),
            id: record.id,
            email: record.email,
            phone: record.phone,
            full_name: record.full_name,
            flight_number: record.flight_number,
            booking_reference: record.booking_reference,
            flight_date: record.flight_date,
            case_number: record.case_number,
            signature: record.signature,
            attachments: record.attachments,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Unpack a JSON body, reporting malformed input as a 400.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/submit-form`
/// Validate and store a new claim.
async fn submit_form<R: ClaimRepository>(
    State(state): State<AppState<R>>,
    payload: Result<Json<SubmitClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let request = json_body(payload)?;
    let record = state.claims.submit(request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            message: "Form submitted successfully",
            id: record.id,
        }),
    ))
}

/// GET `/api/customers`
/// List every claim.
async fn list_customers<R: ClaimRepository>(
    State(state): State<AppState<R>>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let records = state.claims.list().await?;
    Ok(Json(records.into_iter().map(ClaimResponse::from).collect()))
}

/// GET `/api/customers/{id}`
async fn get_customer<R: ClaimRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    let record = state.claims.get_by_id(id).await?;
    Ok(Json(record.into()))
}

/// PUT `/api/customers/{id}`
/// Merge the supplied fields into an existing claim.
async fn update_customer<R: ClaimRepository>(
    State(state): State<AppState<R>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateClaimRequest>, JsonRejection>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    let request = json_body(payload)?;
    let record = state.claims.update(id, request.into()).await?;
    Ok(Json(record.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_fields_map_to_slots() {
        let request: SubmitClaimRequest = serde_json::from_value(json!({
            "email": "jane@example.com",
            "photoUrl": "uploads/photo.jpg",
            "tickets": ["uploads/t1.png", "uploads/t2.png"],
            "ID_Cards": "uploads/id.png",
            "Flight_delay_proof": ["uploads/delay.png"],
            "attachments": { "boarding_pass": "uploads/bp.png" }
        }))
        .unwrap();

        let form = ClaimForm::from(request);
        let refs = &form.attachments;
        assert_eq!(refs.first("photo"), Some("uploads/photo.jpg"));
        assert_eq!(refs.get("tickets").map(<[String]>::len), Some(2));
        assert_eq!(refs.first("id_cards"), Some("uploads/id.png"));
        assert_eq!(refs.first("flight_delay_proof"), Some("uploads/delay.png"));
        assert_eq!(refs.first("boarding_pass"), Some("uploads/bp.png"));
    }

    #[test]
    fn test_blank_legacy_values_are_skipped() {
        let request: SubmitClaimRequest = serde_json::from_value(json!({
            "photoUrl": "",
            "tickets": [],
        }))
        .unwrap();
        assert!(ClaimForm::from(request).attachments.is_empty());
    }

    #[test]
    fn test_update_without_files_leaves_slots_alone() {
        let request: UpdateClaimRequest =
            serde_json::from_value(json!({ "status": "processed" })).unwrap();
        let patch = ClaimPatch::from(request);
        assert!(patch.attachments.is_none());
        assert_eq!(patch.status.as_deref(), Some("processed"));
    }

    #[test]
    fn test_response_uses_camel_case_and_photo_url() {
        let mut attachments = AttachmentRefs::new();
        attachments.push("photo", "uploads/photo.jpg");
        let now = Utc::now();
        let record = ClaimRecord {
            id: ClaimId::new(),
            email: "jane@example.com".to_string(),
            phone: "0612345678".to_string(),
            full_name: "Jane Doe".to_string(),
            flight_number: "KL1234".to_string(),
            booking_reference: "ABC123".to_string(),
            flight_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            case_number: "CASE-0001".to_string(),
            signature: "iVBORw0KGgo=".to_string(),
            attachments,
            status: ClaimStatus::Unprocessed,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(ClaimResponse::from(record)).unwrap();
        assert_eq!(value["fullName"], "Jane Doe");
        assert_eq!(value["flightDate"], "2024-03-01");
        assert_eq!(value["photoUrl"], "uploads/photo.jpg");
        assert_eq!(value["attachments"]["photo"][0], "uploads/photo.jpg");
        assert_eq!(value["status"], "unprocessed");
    }
}
