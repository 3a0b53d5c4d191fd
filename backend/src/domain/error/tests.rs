//! Tests for the domain error payload and its serialisation contract.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn conflict_error() -> Error {
    Error::conflict("email already registered").with_detail("index", "email")
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::unauthorized("no token"), ErrorCode::Unauthorized)]
#[case(Error::forbidden("denied"), ErrorCode::Forbidden)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("taken"), ErrorCode::Conflict)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
#[case(ErrorCode::Forbidden)]
#[case(ErrorCode::InternalError)]
fn blank_messages_fall_back_to_code_default(#[case] code: ErrorCode) {
    let err = Error::new(code, "  ");
    assert_eq!(err.message(), code.default_message());
}

#[rstest]
fn try_new_rejects_blank_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn code_names_match_serialised_form() {
    for code in [
        ErrorCode::InvalidRequest,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::NotFound,
        ErrorCode::Conflict,
        ErrorCode::InternalError,
    ] {
        assert_eq!(serde_json::to_value(code).expect("code serialises"), code.as_str());
    }
}

#[rstest]
fn details_accumulate_by_key() {
    let err = Error::unauthorized("token rejected")
        .with_detail("reason", "expired")
        .with_detail("retry", false)
        .with_detail("reason", "malformed");
    let details = err.details().expect("details attached");
    assert_eq!(details.len(), 2);
    assert_eq!(details["reason"], "malformed");
    assert!(err.without_details().details().is_none());
}

#[rstest]
fn serialises_code_in_snake_case(conflict_error: Error) {
    let value = serde_json::to_value(&conflict_error).expect("error serialises");
    assert_eq!(
        value,
        json!({
            "code": "conflict",
            "message": "email already registered",
            "details": {"index": "email"}
        })
    );
}

#[rstest]
fn details_are_omitted_when_absent() {
    let value = serde_json::to_value(Error::not_found("missing")).expect("error serialises");
    assert!(value.get("details").is_none());
}

#[rstest]
#[case(json!({"code": "not_found", "message": "  "}))]
#[case(json!({"code": "not_found", "message": "gone", "details": [1, 2]}))]
#[case(json!({"code": "not_found", "message": "gone", "traceId": "abc"}))]
#[case(json!({"code": "teapot", "message": "gone"}))]
fn deserialisation_rejects_invalid_payloads(#[case] payload: serde_json::Value) {
    let result: Result<Error, _> = serde_json::from_value(payload.clone());
    assert!(result.is_err(), "{payload} must not deserialise");
}

#[rstest]
fn deserialisation_round_trips_valid_payloads(conflict_error: Error) {
    let value = serde_json::to_value(&conflict_error).expect("error serialises");
    let decoded: Error = serde_json::from_value(value).expect("error deserialises");
    assert_eq!(decoded, conflict_error);
}

#[rstest]
fn display_prefixes_code() {
    assert_eq!(Error::forbidden("denied").to_string(), "forbidden: denied");
}
