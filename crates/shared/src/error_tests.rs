use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::NotFound(String::new()), 404, "not_found")]
#[case(AppError::Validation(String::new()), 400, "validation_error")]
#[case(AppError::BadRequest(String::new()), 400, "bad_request")]
#[case(AppError::PayloadTooLarge(String::new()), 413, "file_too_large")]
#[case(AppError::UnsupportedMediaType(String::new()), 415, "invalid_mime_type")]
#[case(AppError::Decode(String::new()), 500, "signature_decode_failed")]
#[case(AppError::Database(String::new()), 500, "database_error")]
#[case(AppError::Storage(String::new()), 500, "storage_error")]
fn test_status_and_error_codes(
    #[case] err: AppError,
    #[case] status: u16,
    #[case] code: &'static str,
) {
    assert_eq!(err.status_code(), status);
    assert_eq!(err.error_code(), code);
}

#[test]
fn test_error_display() {
    assert_eq!(
        AppError::NotFound("msg".into()).to_string(),
        "Not found: msg"
    );
    assert_eq!(
        AppError::Validation("msg".into()).to_string(),
        "Validation error: msg"
    );
    assert_eq!(
        AppError::PayloadTooLarge("msg".into()).to_string(),
        "Payload too large: msg"
    );
    assert_eq!(
        AppError::Database("msg".into()).to_string(),
        "Database error: msg"
    );
}

#[test]
fn test_public_message_hides_infrastructure_details() {
    let err = AppError::Database("connection refused (os error 111)".into());
    assert!(err.is_server_error());
    assert_eq!(err.public_message(), "Server error");

    let err = AppError::Validation("email is required".into());
    assert!(!err.is_server_error());
    assert_eq!(err.public_message(), "email is required");
}
