//! # API Endpoint Handlers
//!
//! Each handler takes the dojo lock once, works on the snapshot it reads
//! and returns either a JSON body or an [`ApiError`].

use super::{
    AppState,
    types::{
        ApiError, AttendanceRequest, AttendanceResponse, AwardRequest, AwardResponse,
        EligibilityQuery, EligibilityResponse, ExportResponse, HealthResponse, MemberJson,
        MembersQuery, StatusResponse, StickerResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use dojo_core::{
    MemberId, TrainerId,
    formats::{snapshot_digest, snapshot_to_bytes},
};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Roster and ledger counts.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let dojo = state.dojo.read().await;
    Ok(Json(StatusResponse {
        member_count: dojo.member_count()?,
        active_members: dojo.active_members()?.len(),
        record_count: dojo.record_count()?,
        persistent: dojo.is_persistent(),
    }))
}

// =============================================================================
// MEMBER HANDLERS
// =============================================================================

/// List members, active only unless `?all=true`.
pub async fn members_handler(
    State(state): State<AppState>,
    Query(query): Query<MembersQuery>,
) -> Result<Json<Vec<MemberJson>>, ApiError> {
    let dojo = state.dojo.read().await;
    let members = if query.all {
        dojo.members()?
    } else {
        dojo.active_members()?
    };
    Ok(Json(members.iter().map(MemberJson::from).collect()))
}

/// One member.
pub async fn member_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MemberJson>, ApiError> {
    let dojo = state.dojo.read().await;
    let member = dojo.member(MemberId(id))?;
    Ok(Json(MemberJson::from(&member)))
}

/// Exam readiness of one member.
///
/// A member at the top grade answers 409.
pub async fn eligibility_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<EligibilityQuery>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let today = query.today.unwrap_or_else(crate::today);
    let dojo = state.dojo.read().await;
    let member = dojo.member(MemberId(id))?;
    let report = dojo.evaluate(member.id, today)?;
    Ok(Json(EligibilityResponse::new(&member, &report)))
}

// =============================================================================
// STICKER HANDLERS
// =============================================================================

/// Sticker position of one member.
pub async fn stickers_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StickerResponse>, ApiError> {
    let dojo = state.dojo.read().await;
    let status = dojo.sticker_status(MemberId(id))?;
    let tier = dojo.stickers().get(status.current_tier)?;
    Ok(Json(StickerResponse::new(&status, tier.name.clone())))
}

/// Award the next due sticker.
pub async fn award_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<AwardRequest>,
) -> Result<Json<AwardResponse>, ApiError> {
    let date = request.date.unwrap_or_else(crate::today);
    let mut dojo = state.dojo.write().await;
    let awarded = dojo.award(MemberId(id), TrainerId(request.trainer_id), date)?;

    let awarded_tier = awarded.as_ref().map(|m| m.sticker_tier);
    if let Some(tier) = awarded_tier {
        tracing::info!(member = id, trainer = request.trainer_id, tier, "Sticker awarded");
    }
    let status = dojo.sticker_status(MemberId(id))?;

    Ok(Json(AwardResponse {
        awarded: awarded_tier,
        sticker_tier: status.current_tier,
        still_pending: status.pending,
    }))
}

// =============================================================================
// ATTENDANCE HANDLER
// =============================================================================

/// Record attendance for one day.
pub async fn attendance_handler(
    State(state): State<AppState>,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let ids = request.ids();
    let mut dojo = state.dojo.write().await;
    let outcome = dojo.record_attendance(&ids, request.date, request.exam)?;

    if !outcome.repeated.is_empty() {
        tracing::warn!(
            date = %request.date,
            repeated = ?outcome.repeated,
            "Attendance resubmitted; repeated ids are counted twice"
        );
    }

    Ok(Json(AttendanceResponse {
        recorded: outcome.recorded,
        repeated: outcome.repeated.iter().map(|id| id.0).collect(),
    }))
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Binary snapshot, base64 encoded.
pub async fn export_handler(
    State(state): State<AppState>,
) -> Result<Json<ExportResponse>, ApiError> {
    let dojo = state.dojo.read().await;
    let data = snapshot_to_bytes(&dojo.snapshot()?)?;
    let digest = snapshot_digest(&data);
    Ok(Json(ExportResponse::new(&data, digest)))
}
