//! Tests for the error taxonomy and payload formatting.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn rate_limited() -> AppError {
    AppError::new(ErrorKind::RateLimited, "Rate limit exceeded").with_detail("retry_after", 30)
}

#[rstest]
#[case(ErrorKind::InvalidPdf, 400)]
#[case(ErrorKind::FileTooLarge, 400)]
#[case(ErrorKind::UnsupportedFileType, 400)]
#[case(ErrorKind::FileCorrupted, 400)]
#[case(ErrorKind::DuplicateFile, 400)]
#[case(ErrorKind::ValidationError, 400)]
#[case(ErrorKind::InvalidState, 400)]
#[case(ErrorKind::OperationNotAllowed, 400)]
#[case(ErrorKind::AuthError, 401)]
#[case(ErrorKind::FileNotFound, 404)]
#[case(ErrorKind::RecordNotFound, 404)]
#[case(ErrorKind::DuplicateRecord, 409)]
#[case(ErrorKind::DocumentNotReady, 409)]
#[case(ErrorKind::RateLimited, 429)]
#[case(ErrorKind::QuotaExceeded, 429)]
#[case(ErrorKind::DbError, 500)]
#[case(ErrorKind::DbTransactionError, 500)]
#[case(ErrorKind::InternalError, 500)]
#[case(ErrorKind::ConfigurationError, 500)]
#[case(ErrorKind::ApiError, 502)]
#[case(ErrorKind::DbConnectionError, 503)]
#[case(ErrorKind::Timeout, 504)]
#[case(ErrorKind::ProcessingTimeout, 504)]
fn kinds_map_to_expected_status(#[case] kind: ErrorKind, #[case] expected: u16) {
    assert_eq!(kind.status_code(), expected);
    assert_eq!(status_for(kind), expected);
    assert_eq!(status_for_code(kind.as_str()), expected);
}

#[rstest]
fn every_kind_maps_into_the_allowed_status_set() {
    let allowed = [400, 401, 404, 409, 429, 500, 502, 503, 504];
    for kind in ErrorKind::ALL {
        assert!(
            allowed.contains(&kind.status_code()),
            "{kind} mapped to {}",
            kind.status_code()
        );
    }
}

#[rstest]
fn wire_codes_match_serde_representation() {
    for kind in ErrorKind::ALL {
        let encoded = serde_json::to_value(kind).expect("serialise kind");
        assert_eq!(encoded, json!(kind.as_str()));
        assert_eq!(ErrorKind::from_code(kind.as_str()), kind);
    }
}

#[rstest]
#[case("SOMETHING_NEW")]
#[case("")]
#[case("rate_limited")]
fn unmapped_codes_default_to_500(#[case] code: &str) {
    assert_eq!(ErrorKind::from_code(code), ErrorKind::UnknownError);
    assert_eq!(status_for_code(code), 500);
}

#[rstest]
fn new_uses_kind_defaults() {
    let err = AppError::new(ErrorKind::DuplicateRecord, "already exists");
    assert_eq!(err.kind(), ErrorKind::DuplicateRecord);
    assert_eq!(err.message(), "already exists");
    assert!(err.details().is_empty());
    assert_eq!(err.status_code(), 409);
    assert!(!err.is_retryable());
}

#[rstest]
fn empty_messages_are_accepted() {
    let err = AppError::new(ErrorKind::UnknownError, "");
    assert_eq!(err.message(), "");
}

#[rstest]
fn builders_override_defaults(rate_limited: AppError) {
    let err = rate_limited.with_status(503).with_retryable(true);
    assert_eq!(err.status_code(), 503);
    assert!(err.is_retryable());
    assert_eq!(err.details().get("retry_after"), Some(&json!(30)));
}

#[rstest]
fn payload_contains_exactly_three_keys(rate_limited: AppError) {
    let value = serde_json::to_value(rate_limited.to_payload()).expect("serialise payload");
    let object = value.as_object().expect("payload is an object");
    let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["details", "error_code", "message"]);
    assert_eq!(value["error_code"], "RATE_LIMITED");
    assert_eq!(value["details"]["retry_after"], 30);
}

#[rstest]
fn payload_encoding_is_idempotent(rate_limited: AppError) {
    let first = serde_json::to_string(&rate_limited.to_payload()).expect("encode");
    let decoded: ErrorPayload = serde_json::from_str(&first).expect("decode");
    let second = serde_json::to_string(&decoded).expect("re-encode");
    assert_eq!(first, second);
    assert_eq!(decoded, rate_limited.to_payload());
}

#[rstest]
fn display_includes_details_when_present(rate_limited: AppError) {
    assert_eq!(
        rate_limited.to_string(),
        r#"RATE_LIMITED: Rate limit exceeded, details={"retry_after":30}"#
    );
    assert_eq!(
        AppError::not_found("missing").to_string(),
        "RECORD_NOT_FOUND: missing"
    );
}

#[rstest]
fn strip_details_removes_only_named_keys() {
    let mut err = AppError::internal("boom")
        .with_detail("db_error", "relation missing")
        .with_detail("table", "documents");
    assert!(err.strip_details(&["db_error", "exception"]));
    assert!(!err.strip_details(&["db_error"]));
    assert_eq!(err.details().len(), 1);
    assert!(err.details().contains_key("table"));
}
