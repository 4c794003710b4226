//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use chrono::NaiveDate;
use dojo::api::{
    ApiError, AttendanceRequest, AwardRequest, ErrorResponse, ExportResponse, HealthResponse,
    MemberJson, StatusResponse,
};
use dojo_core::{DojoError, Member, MemberId};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_serialization() {
    let status = StatusResponse {
        member_count: 42,
        active_members: 37,
        record_count: 310,
        persistent: true,
    };

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"member_count\":42"));
    assert!(json.contains("\"active_members\":37"));
    assert!(json.contains("\"record_count\":310"));
    assert!(json.contains("\"persistent\":true"));
}

// =============================================================================
// MEMBER JSON
// =============================================================================

#[test]
fn test_member_json_dates_are_iso() {
    let birth = NaiveDate::from_ymd_opt(2015, 5, 1).unwrap();
    let mut member = Member::new(MemberId(7), "Lena", "Koch", birth, "8. Kyu gelb");
    member.last_exam_date = NaiveDate::from_ymd_opt(2024, 3, 9);

    let json = serde_json::to_string(&MemberJson::from(&member)).unwrap();
    assert!(json.contains("\"id\":7"));
    assert!(json.contains("\"birth_date\":\"2015-05-01\""));
    assert!(json.contains("\"last_exam_date\":\"2024-03-09\""));
    assert!(json.contains("\"group\":null"));
}

// =============================================================================
// REQUESTS
// =============================================================================

#[test]
fn test_attendance_request_exam_defaults_false() {
    let json = r#"{"date":"2024-02-01","member_ids":[3,4,4]}"#;
    let request: AttendanceRequest = serde_json::from_str(json).unwrap();

    assert!(!request.exam);
    assert_eq!(request.ids(), vec![MemberId(3), MemberId(4), MemberId(4)]);
}

#[test]
fn test_attendance_request_rejects_bad_date() {
    let json = r#"{"date":"01.02.2024","member_ids":[3]}"#;
    assert!(serde_json::from_str::<AttendanceRequest>(json).is_err());
}

#[test]
fn test_award_request_date_optional() {
    let request: AwardRequest = serde_json::from_str(r#"{"trainer_id":2}"#).unwrap();
    assert_eq!(request.trainer_id, 2);
    assert!(request.date.is_none());
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

#[test]
fn test_export_response_encodes_base64() {
    let export = ExportResponse::new(b"DOJO", "abc".to_string());
    assert_eq!(export.data, "RE9KTw==");
    assert_eq!(export.size, 4);
    assert_eq!(export.digest, "abc");
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[test]
fn test_error_status_mapping() {
    let cases = [
        (DojoError::MemberNotFound(MemberId(9)), StatusCode::NOT_FOUND),
        (
            DojoError::NoSuccessorGrade("1. Dan schwarz".to_string()),
            StatusCode::CONFLICT,
        ),
        (DojoError::NoSuccessorTier(800), StatusCode::CONFLICT),
        (
            DojoError::UnknownGrade("Gelbgurt".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            DojoError::InvalidDate("exam in the future".to_string()),
            StatusCode::BAD_REQUEST,
        ),
        (
            DojoError::IoError("disk full".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        let (status, _) = ApiError(error).status();
        assert_eq!(status, expected);
    }
}

#[test]
fn test_error_response_deserialization() {
    let json = r#"{"code":"NOT_FOUND","error":"member 9 not found"}"#;
    let error: ErrorResponse = serde_json::from_str(json).unwrap();
    assert_eq!(error.code, "NOT_FOUND");
}
