//! Validation rules for claim submissions and updates.

use chrono::{DateTime, NaiveDate, Utc};
use claimdesk_shared::ClaimId;

use super::error::{ValidationErrors, Violation};
use super::types::{
    AttachmentRefs, ClaimChanges, ClaimForm, ClaimPatch, ClaimStatus, MAX_SIGNATURE_LEN, NewClaim,
};

const MAX_SLOT_NAME_LEN: usize = 64;

/// Validates a submission and assembles a new claim with a fresh id and
/// the default status.
///
/// All violations are collected, not just the first one.
///
/// # Errors
///
/// Returns every violated constraint when the form is invalid.
pub fn validate_submission(form: ClaimForm) -> Result<NewClaim, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let email = required_text(&mut errors, "email", form.email);
    let phone = required_text(&mut errors, "phone", form.phone);
    let full_name = required_text(&mut errors, "full_name", form.full_name);
    let flight_number = required_text(&mut errors, "flight_number", form.flight_number);
    let booking_reference =
        required_text(&mut errors, "booking_reference", form.booking_reference);
    let flight_date = match form.flight_date {
        Some(raw) => check_flight_date(&mut errors, &raw),
        None => {
            errors.add("flight_date", Violation::Missing);
            None
        }
    };
    let case_number = required_text(&mut errors, "case_number", form.case_number);
    let signature = match form.signature {
        Some(raw) => check_signature(&mut errors, raw),
        None => {
            errors.add("signature", Violation::Missing);
            None
        }
    };
    check_attachments(&mut errors, &form.attachments);

    match (
        email,
        phone,
        full_name,
        flight_number,
        booking_reference,
        flight_date,
        case_number,
        signature,
    ) {
        (
            Some(email),
            Some(phone),
            Some(full_name),
            Some(flight_number),
            Some(booking_reference),
            Some(flight_date),
            Some(case_number),
            Some(signature),
        ) if errors.is_empty() => Ok(NewClaim {
            id: ClaimId::new(),
            email,
            phone,
            full_name,
            flight_number,
            booking_reference,
            flight_date,
            case_number,
            signature,
            attachments: form.attachments,
            status: ClaimStatus::default(),
        }),
        _ => Err(errors),
    }
}

/// Validates a partial update. Only supplied fields are checked, with the
/// same rules as a submission.
///
/// # Errors
///
/// Returns every violated constraint when a supplied field is invalid.
pub fn validate_changes(patch: ClaimPatch) -> Result<ClaimChanges, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let changes = ClaimChanges {
        email: optional_text(&mut errors, "email", patch.email),
        phone: optional_text(&mut errors, "phone", patch.phone),
        full_name: optional_text(&mut errors, "full_name", patch.full_name),
        flight_number: optional_text(&mut errors, "flight_number", patch.flight_number),
        booking_reference: optional_text(&mut errors, "booking_reference", patch.booking_reference),
        flight_date: patch
            .flight_date
            .and_then(|raw| check_flight_date(&mut errors, &raw)),
        case_number: optional_text(&mut errors, "case_number", patch.case_number),
        signature: patch
            .signature
            .and_then(|raw| check_signature(&mut errors, raw)),
        attachments: patch.attachments.inspect(|refs| check_attachments(&mut errors, refs)),
        status: patch.status.and_then(|raw| {
            let status = ClaimStatus::parse(raw.trim());
            if status.is_none() {
                errors.add("status", Violation::UnknownStatus(raw));
            }
            status
        }),
    };

    errors.into_result().map(|()| changes)
}

/// Parses a flight date from `YYYY-MM-DD` or an RFC 3339 timestamp.
///
/// Timestamps keep the calendar date of the instant in UTC.
#[must_use]
pub fn parse_flight_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    if value.is_none() {
        errors.add(field, Violation::Missing);
    }
    optional_text(errors, field, value)
}

fn optional_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, Violation::Blank);
        return None;
    }
    Some(trimmed.to_string())
}

fn check_flight_date(errors: &mut ValidationErrors, raw: &str) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        errors.add("flight_date", Violation::Blank);
        return None;
    }
    let date = parse_flight_date(raw);
    if date.is_none() {
        errors.add("flight_date", Violation::InvalidDate(raw.to_string()));
    }
    date
}

fn check_signature(errors: &mut ValidationErrors, raw: String) -> Option<String> {
    if raw.trim().is_empty() {
        errors.add("signature", Violation::Blank);
        return None;
    }
    let len = raw.chars().count();
    if len > MAX_SIGNATURE_LEN {
        errors.add(
            "signature",
            Violation::TooLong {
                actual: len,
                max: MAX_SIGNATURE_LEN,
            },
        );
        return None;
    }
    Some(raw)
}

fn check_attachments(errors: &mut ValidationErrors, refs: &AttachmentRefs) {
    for (slot, references) in refs.iter() {
        let valid_name = !slot.is_empty()
            && slot.len() <= MAX_SLOT_NAME_LEN
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            errors.add("attachments", Violation::InvalidSlot(slot.to_string()));
        }
        if references.iter().any(|r| r.trim().is_empty()) {
            errors.add("attachments", Violation::BlankReference(slot.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_form() -> ClaimForm {
        ClaimForm {
            email: Some("jane@example.com".to_string()),
            phone: Some("+31 6 1234 5678".to_string()),
            full_name: Some("Jane Doe".to_string()),
            flight_number: Some("KL1234".to_string()),
            booking_reference: Some("ABC123".to_string()),
            flight_date: Some("2024-03-01".to_string()),
            case_number: Some("CASE-0001".to_string()),
            signature: Some("iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk".to_string()),
            attachments: AttachmentRefs::new(),
        }
    }

    #[test]
    fn test_valid_submission() {
        let claim = validate_submission(valid_form()).expect("form is valid");
        assert_eq!(claim.email, "jane@example.com");
        assert_eq!(claim.flight_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(claim.status, ClaimStatus::Unprocessed);
        assert!(claim.attachments.is_empty());
    }

    #[test]
    fn test_submission_trims_text_fields() {
        let mut form = valid_form();
        form.full_name = Some("  Jane Doe \n".to_string());
        let claim = validate_submission(form).unwrap();
        assert_eq!(claim.full_name, "Jane Doe");
    }

    #[test]
    fn test_submissions_get_distinct_ids() {
        let a = validate_submission(valid_form()).unwrap();
        let b = validate_submission(valid_form()).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[rstest]
    #[case::email("email")]
    #[case::phone("phone")]
    #[case::full_name("full_name")]
    #[case::flight_number("flight_number")]
    #[case::booking_reference("booking_reference")]
    #[case::flight_date("flight_date")]
    #[case::case_number("case_number")]
    #[case::signature("signature")]
    fn test_missing_required_field(#[case] field: &str) {
        let mut form = valid_form();
        match field {
            "email" => form.email = None,
            "phone" => form.phone = None,
            "full_name" => form.full_name = None,
            "flight_number" => form.flight_number = None,
            "booking_reference" => form.booking_reference = None,
            "flight_date" => form.flight_date = None,
            "case_number" => form.case_number = None,
            "signature" => form.signature = None,
            _ => unreachable!(),
        }

        let errors = validate_submission(form).unwrap_err();
        assert_eq!(errors.violations().len(), 1);
        assert_eq!(errors.violations()[0].field, field);
        assert_eq!(errors.violations()[0].violation, Violation::Missing);
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        let mut form = valid_form();
        form.email = Some("   ".to_string());
        form.case_number = Some(String::new());

        let errors = validate_submission(form).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("case_number"));
        assert!(errors.violations().iter().all(|v| v.violation == Violation::Blank));
    }

    #[test]
    fn test_all_violations_are_collected() {
        let errors = validate_submission(ClaimForm::default()).unwrap_err();
        assert_eq!(errors.violations().len(), 8);
    }

    #[rstest]
    #[case("2024-03-01", Some((2024, 3, 1)))]
    #[case(" 2024-12-31 ", Some((2024, 12, 31)))]
    #[case("2024-03-01T00:00:00.000Z", Some((2024, 3, 1)))]
    #[case("2024-03-01T23:30:00-02:00", Some((2024, 3, 2)))]
    #[case("2024-02-30", None)]
    #[case("01/03/2024", None)]
    #[case("tomorrow", None)]
    fn test_parse_flight_date(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(parse_flight_date(raw), expected);
    }

    #[test]
    fn test_invalid_flight_date() {
        let mut form = valid_form();
        form.flight_date = Some("not-a-date".to_string());
        let errors = validate_submission(form).unwrap_err();
        assert_eq!(
            errors.violations()[0].violation,
            Violation::InvalidDate("not-a-date".to_string())
        );
    }

    #[test]
    fn test_signature_at_bound_is_accepted() {
        let mut form = valid_form();
        form.signature = Some("A".repeat(MAX_SIGNATURE_LEN));
        assert!(validate_submission(form).is_ok());
    }

    #[test]
    fn test_signature_over_bound_is_rejected() {
        let mut form = valid_form();
        form.signature = Some("A".repeat(MAX_SIGNATURE_LEN + 1));
        let errors = validate_submission(form).unwrap_err();
        assert_eq!(
            errors.violations()[0].violation,
            Violation::TooLong {
                actual: MAX_SIGNATURE_LEN + 1,
                max: MAX_SIGNATURE_LEN
            }
        );
    }

    #[test]
    fn test_attachment_slots_are_checked() {
        let mut form = valid_form();
        form.attachments.push("photo", "uploads/1.png");
        form.attachments.push("bad slot!", "uploads/2.png");
        form.attachments.push("tickets", " ");

        let errors = validate_submission(form).unwrap_err();
        assert_eq!(
            errors.violations()[0].violation,
            Violation::InvalidSlot("bad slot!".to_string())
        );
        assert_eq!(
            errors.violations()[1].violation,
            Violation::BlankReference("tickets".to_string())
        );
    }

    #[test]
    fn test_changes_only_contain_supplied_fields() {
        let patch = ClaimPatch {
            phone: Some(" 0612345678 ".to_string()),
            status: Some("processed".to_string()),
            ..Default::default()
        };
        let changes = validate_changes(patch).unwrap();
        assert_eq!(changes.phone.as_deref(), Some("0612345678"));
        assert_eq!(changes.status, Some(ClaimStatus::Processed));
        assert!(changes.email.is_none());
        assert!(changes.signature.is_none());
    }

    #[test]
    fn test_empty_patch_is_valid() {
        let changes = validate_changes(ClaimPatch::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_invalid_changes() {
        let patch = ClaimPatch {
            email: Some(String::new()),
            flight_date: Some("2024-13-01".to_string()),
            status: Some("archived".to_string()),
            signature: Some("A".repeat(MAX_SIGNATURE_LEN + 1)),
            ..Default::default()
        };
        let errors = validate_changes(patch).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("flight_date"));
        assert!(errors.has_field("status"));
        assert!(errors.has_field("signature"));
    }
}
