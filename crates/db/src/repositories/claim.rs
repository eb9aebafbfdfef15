//! Claim repository for database operations.
//!
//! Implements the claim store on Postgres using SeaORM.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, UpdateMany,
};
use tracing::debug;

use crate::entities::claims;
use claimdesk_core::claim::{
    AttachmentRefs, ClaimChanges, ClaimError, ClaimRecord, ClaimRepository as ClaimRepoTrait,
    ClaimStatus, NewClaim,
};
use claimdesk_shared::ClaimId;

/// Claim repository implementation.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    db: DatabaseConnection,
}

impl ClaimRepository {
    /// Create a new claim repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl ClaimRepoTrait for ClaimRepository {
    async fn create(&self, claim: NewClaim) -> Result<ClaimRecord, ClaimError> {
        let record = ClaimRecord::from_new(claim, Utc::now());

        let model = to_active(&record)?
            .insert(&self.db)
            .await
            .map_err(repository_error)?;

        to_domain(model)
    }

    async fn list_all(&self) -> Result<Vec<ClaimRecord>, ClaimError> {
        let models = claims::Entity::find()
            .order_by_desc(claims::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(repository_error)?;

        models.into_iter().map(to_domain).collect()
    }

    async fn find_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ClaimError> {
        let model = claims::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(repository_error)?;

        model.map(to_domain).transpose()
    }

    async fn update(
        &self,
        id: ClaimId,
        changes: ClaimChanges,
    ) -> Result<Option<ClaimRecord>, ClaimError> {
        if changes.is_empty() {
            debug!(claim_id = %id, "Empty claim update");
            return self.find_by_id(id).await;
        }

        let models = update_statement(id, changes, Utc::now())?
            .exec_with_returning(&self.db)
            .await
            .map_err(repository_error)?;

        models.into_iter().next().map(to_domain).transpose()
    }
}

/// One `UPDATE .. RETURNING` touching only the supplied columns.
///
/// Attachment slots are merged into the stored object with `||`, so
/// concurrent updates of different fields or slots never undo each other.
fn update_statement(
    id: ClaimId,
    changes: ClaimChanges,
    now: DateTime<Utc>,
) -> Result<UpdateMany<claims::Entity>, ClaimError> {
    let mut active = claims::ActiveModel {
        updated_at: Set(now.into()),
        ..Default::default()
    };
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(phone) = changes.phone {
        active.phone = Set(phone);
    }
    if let Some(full_name) = changes.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(flight_number) = changes.flight_number {
        active.flight_number = Set(flight_number);
    }
    if let Some(booking_reference) = changes.booking_reference {
        active.booking_reference = Set(booking_reference);
    }
    if let Some(flight_date) = changes.flight_date {
        active.flight_date = Set(flight_date);
    }
    if let Some(case_number) = changes.case_number {
        active.case_number = Set(case_number);
    }
    if let Some(signature) = changes.signature {
        active.signature = Set(signature);
    }
    if let Some(status) = changes.status {
        active.status = Set(status.as_str().to_string());
    }

    let mut update = claims::Entity::update_many()
        .set(active)
        .filter(claims::Column::Id.eq(id.into_inner()));

    if let Some(attachments) = changes.attachments {
        let slots = serde_json::to_value(&attachments)
            .map_err(|e| ClaimError::repository(format!("failed to encode attachments: {e}")))?;
        update = update.col_expr(
            claims::Column::Attachments,
            Expr::cust_with_values(r#""attachments" || $1::jsonb"#, [slots]),
        );
    }

    Ok(update)
}

fn repository_error(err: DbErr) -> ClaimError {
    ClaimError::repository(err.to_string())
}

/// Convert domain record to an insertable active model.
fn to_active(record: &ClaimRecord) -> Result<claims::ActiveModel, ClaimError> {
    let attachments = serde_json::to_value(&record.attachments)
        .map_err(|e| ClaimError::repository(format!("failed to encode attachments: {e}")))?;

    Ok(claims::ActiveModel {
        id: Set(record.id.into_inner()),
        email: Set(record.email.clone()),
        phone: Set(record.phone.clone()),
        full_name: Set(record.full_name.clone()),
        flight_number: Set(record.flight_number.clone()),
        booking_reference: Set(record.booking_reference.clone()),
        flight_date: Set(record.flight_date),
        case_number: Set(record.case_number.clone()),
        signature: Set(record.signature.clone()),
        attachments: Set(attachments),
        status: Set(record.status.as_str().to_string()),
        created_at: Set(record.created_at.into()),
        updated_at: Set(record.updated_at.into()),
    })
}

/// Convert database model to domain record.
fn to_domain(model: claims::Model) -> Result<ClaimRecord, ClaimError> {
    let status = ClaimStatus::parse(&model.status).ok_or_else(|| {
        ClaimError::repository(format!(
            "unknown status '{}' stored for claim {}",
            model.status, model.id
        ))
    })?;
    let attachments: AttachmentRefs = serde_json::from_value(model.attachments).map_err(|e| {
        ClaimError::repository(format!("malformed attachments for claim {}: {e}", model.id))
    })?;

    Ok(ClaimRecord {
        id: ClaimId::from_uuid(model.id),
        email: model.email,
        phone: model.phone,
        full_name: model.full_name,
        flight_number: model.flight_number,
        booking_reference: model.booking_reference,
        flight_date: model.flight_date,
        case_number: model.case_number,
        signature: model.signature,
        attachments,
        status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use rstest::rstest;
    use sea_orm::{DbBackend, QueryTrait};
    use serde_json::json;

    fn record() -> ClaimRecord {
        let mut attachments = AttachmentRefs::new();
        attachments.push("photo", "uploads/1700000000000-ab12cd34.jpg");
        attachments.push("tickets", "uploads/t1.png");
        attachments.push("tickets", "uploads/t2.png");
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 9, 30, 0).unwrap();

        ClaimRecord {
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
            status: ClaimStatus::InReview,
            created_at: now,
            updated_at: now,
        }
    }

    fn model_of(record: &ClaimRecord) -> claims::Model {
        claims::Model {
            id: record.id.into_inner(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            full_name: record.full_name.clone(),
            flight_number: record.flight_number.clone(),
            booking_reference: record.booking_reference.clone(),
            flight_date: record.flight_date,
            case_number: record.case_number.clone(),
            signature: record.signature.clone(),
            attachments: serde_json::to_value(&record.attachments).unwrap(),
            status: record.status.as_str().to_string(),
            created_at: record.created_at.into(),
            updated_at: record.updated_at.into(),
        }
    }

    #[test]
    fn test_to_domain_maps_every_column() {
        let expected = record();
        let mapped = to_domain(model_of(&expected)).unwrap();
        assert_eq!(mapped, expected);
    }

    #[test]
    fn test_to_active_encodes_attachments_as_object() {
        let active = to_active(&record()).unwrap();
        let attachments = active.attachments.unwrap();
        assert_eq!(
            attachments,
            json!({
                "photo": ["uploads/1700000000000-ab12cd34.jpg"],
                "tickets": ["uploads/t1.png", "uploads/t2.png"],
            })
        );
        assert_eq!(active.status.unwrap(), "in_review");
    }

    #[rstest]
    #[case("archived")]
    #[case("")]
    #[case("Processed")]
    fn test_unknown_stored_status_is_repository_error(#[case] status: &str) {
        let mut model = model_of(&record());
        model.status = status.to_string();
        assert!(matches!(to_domain(model), Err(ClaimError::Repository(_))));
    }

    #[test]
    fn test_malformed_attachments_is_repository_error() {
        let mut model = model_of(&record());
        model.attachments = json!(["uploads/a.png"]);
        assert!(matches!(to_domain(model), Err(ClaimError::Repository(_))));
    }

    #[test]
    fn test_empty_attachments_object() {
        let mut model = model_of(&record());
        model.attachments = json!({});
        assert!(to_domain(model).unwrap().attachments.is_empty());
    }

    fn update_sql(id: ClaimId, changes: ClaimChanges) -> String {
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 8, 0, 0).unwrap();
        update_statement(id, changes, now)
            .unwrap()
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_update_writes_only_supplied_columns() {
        let id = ClaimId::new();
        let sql = update_sql(
            id,
            ClaimChanges {
                status: Some(ClaimStatus::Processed),
                ..ClaimChanges::default()
            },
        );

        assert!(sql.starts_with(r#"UPDATE "claims" SET"#), "{sql}");
        assert!(sql.contains(r#""status" = 'processed'"#), "{sql}");
        assert!(sql.contains(r#""updated_at" = "#), "{sql}");
        assert!(sql.contains(&id.to_string()), "{sql}");
        for untouched in ["email", "phone", "full_name", "signature", "attachments", "created_at"] {
            assert!(!sql.contains(&format!("\"{untouched}\"")), "{untouched} written: {sql}");
        }
    }

    #[test]
    fn test_update_merges_attachment_slots_in_place() {
        let mut slots = AttachmentRefs::new();
        slots.push("photo", "uploads/new.png");
        let sql = update_sql(
            ClaimId::new(),
            ClaimChanges {
                phone: Some("0698765432".to_string()),
                attachments: Some(slots),
                ..ClaimChanges::default()
            },
        );

        assert!(sql.contains(r#""phone" = '0698765432'"#), "{sql}");
        assert!(sql.contains(r#""attachments" = "attachments" || '"#), "{sql}");
        assert!(sql.contains("uploads/new.png"), "{sql}");
        assert!(sql.contains("::jsonb"), "{sql}");
        assert!(!sql.contains(r#""status""#), "{sql}");
    }
}
