//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//! Dates travel as `YYYY-MM-DD` strings.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use dojo_core::{DojoError, EligibilityReport, Member, MemberId, StickerStatus};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Roster status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub member_count: usize,
    pub active_members: usize,
    pub record_count: usize,
    pub persistent: bool,
}

// =============================================================================
// MEMBERS
// =============================================================================

/// Query string of `GET /members`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MembersQuery {
    /// Include deactivated members.
    #[serde(default)]
    pub all: bool,
}

/// A member as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJson {
    pub id: u64,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: NaiveDate,
    pub grade: String,
    pub last_exam_date: Option<NaiveDate>,
    pub group: Option<String>,
    pub active: bool,
    pub legacy_total: u32,
    pub sticker_tier: u32,
}

impl From<&Member> for MemberJson {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.0,
            given_name: member.given_name.clone(),
            family_name: member.family_name.clone(),
            birth_date: member.birth_date,
            grade: member.grade.clone(),
            last_exam_date: member.last_exam_date,
            group: member.group.clone(),
            active: member.active,
            legacy_total: member.legacy_total,
            sticker_tier: member.sticker_tier,
        }
    }
}

// =============================================================================
// ELIGIBILITY
// =============================================================================

/// Query string of `GET /members/{id}/eligibility`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EligibilityQuery {
    /// Evaluate as of this date instead of today.
    pub today: Option<NaiveDate>,
}

/// Exam readiness of one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub member_id: u64,
    pub grade: String,
    pub target_grade: Option<String>,
    pub passed: bool,
    /// One line per failed gate, units first.
    pub reasons: Vec<String>,
    /// First reason, for tabular display.
    pub summary: Option<String>,
    pub detail_key: Option<String>,
    pub baseline: Option<NaiveDate>,
    pub units_since_baseline: i64,
    pub months_since_baseline: u32,
    pub age: u32,
}

impl EligibilityResponse {
    pub fn new(member: &Member, report: &EligibilityReport) -> Self {
        Self {
            member_id: member.id.0,
            grade: member.grade.clone(),
            target_grade: report.target_grade.clone(),
            passed: report.passed,
            reasons: report.reasons(),
            summary: report.summary(),
            detail_key: report.detail_key().map(str::to_string),
            baseline: report.baseline,
            units_since_baseline: report.units_since_baseline,
            months_since_baseline: report.months_since_baseline,
            age: report.age,
        }
    }
}

// =============================================================================
// STICKERS
// =============================================================================

/// Sticker position of one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StickerResponse {
    pub member_id: u64,
    pub total_units: u64,
    pub current_tier: u32,
    pub current_tier_name: String,
    pub due: Option<u32>,
    pub pending: Vec<u32>,
}

impl StickerResponse {
    pub fn new(status: &StickerStatus, tier_name: impl Into<String>) -> Self {
        Self {
            member_id: status.member.0,
            total_units: status.total_units,
            current_tier: status.current_tier,
            current_tier_name: tier_name.into(),
            due: status.due,
            pending: status.pending.clone(),
        }
    }
}

/// Award request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRequest {
    /// Member id of the trainer handing out the sticker.
    pub trainer_id: u64,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Award response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardResponse {
    /// Tier awarded by this call, `None` if nothing was due.
    pub awarded: Option<u32>,
    pub sticker_tier: u32,
    /// Further tiers the member has already earned.
    pub still_pending: Vec<u32>,
}

// =============================================================================
// ATTENDANCE
// =============================================================================

/// Attendance submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    pub date: NaiveDate,
    pub member_ids: Vec<u64>,
    /// Record into the exam list instead of the training list.
    #[serde(default)]
    pub exam: bool,
}

impl AttendanceRequest {
    pub fn ids(&self) -> Vec<MemberId> {
        self.member_ids.iter().copied().map(MemberId).collect()
    }
}

/// Attendance response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceResponse {
    pub recorded: usize,
    /// Ids that were already listed for the day.
    pub repeated: Vec<u64>,
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Snapshot export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub data: String, // Base64 encoded
    pub size: usize,
    /// BLAKE3 digest of the raw bytes.
    pub digest: String,
}

impl ExportResponse {
    pub fn new(data: &[u8], digest: String) -> Self {
        Self {
            data: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data),
            size: data.len(),
            digest,
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

/// A [`DojoError`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub DojoError);

impl From<DojoError> for ApiError {
    fn from(e: DojoError) -> Self {
        Self(e)
    }
}

impl ApiError {
    /// HTTP status and code string for the wrapped error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            DojoError::MemberNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DojoError::NoSuccessorGrade(_) | DojoError::NoSuccessorTier(_) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            DojoError::UnknownGrade(_)
            | DojoError::UnknownStickerTier(_)
            | DojoError::InvalidMember(_)
            | DojoError::InvalidDate(_)
            | DojoError::InvalidRow { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            DojoError::DataIntegrity(_)
            | DojoError::InvalidRules(_)
            | DojoError::SerializationError(_)
            | DojoError::DeserializationError(_)
            | DojoError::IoError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        let body = ErrorResponse {
            code: code.to_string(),
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
