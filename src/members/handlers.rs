use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument, warn};

use crate::{
    auth::{jwt::AuthUser, password::hash_password},
    error::ServiceError,
    members::{
        dto::{
            AssignSponsorRequest, ChangePasswordRequest, CreateMemberRequest, MemberDetails,
            MemberFilter, RecordStepRequest, SetStatusRequest,
        },
        repo::{self, Member, MemberSummary, STATUS_ACTIVE, STATUS_INACTIVE},
    },
    sponsorship,
    state::AppState,
};

pub fn member_routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route("/members/:id", get(get_member))
        .route("/members/:id/step", put(record_step))
        .route("/members/:id/sponsor", put(assign_sponsor))
        .route("/members/:id/password", put(change_password))
        .route("/members/:id/relapse", put(record_relapse))
        .route("/members/:id/status", put(set_status))
}

#[instrument(skip(state, _auth))]
pub async fn list_members(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<MemberFilter>,
) -> Result<Json<Vec<MemberSummary>>, (StatusCode, String)> {
    let status = match filter.status.as_deref() {
        Some("active") => Some(STATUS_ACTIVE),
        Some("inactive") => Some(STATUS_INACTIVE),
        _ => None,
    };
    let members = repo::list(&state.db, status).await.map_err(internal)?;
    Ok(Json(members))
}

#[instrument(skip(state, _auth))]
pub async fn get_member(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<MemberDetails>, (StatusCode, String)> {
    let member = repo::get(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Member not found.".to_string()))?;
    let sponsees = repo::open_sponsees_of(&state.db, id)
        .await
        .map_err(internal)?;
    Ok(Json(MemberDetails { member, sponsees }))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_member(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<Member>), (StatusCode, String)> {
    if payload.alias.trim().is_empty() || payload.password.is_empty() {
        warn!("member registration with missing fields");
        return Err((
            StatusCode::BAD_REQUEST,
            "All fields are required.".to_string(),
        ));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let member = repo::create(
        &state.db,
        payload.alias.trim(),
        payload.joined_on,
        payload.sober_since,
        &hash,
    )
    .await
    .map_err(internal)?;

    Ok((StatusCode::CREATED, Json(member)))
}

#[instrument(skip(state, _auth))]
pub async fn record_step(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecordStepRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.step < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Step must be a positive number.".to_string(),
        ));
    }
    repo::record_step(&state.db, id, payload.step)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "Step recorded." })))
}

#[instrument(skip(state, _auth))]
pub async fn assign_sponsor(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignSponsorRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    sponsorship::repo::reassign_sponsor(&state.db, id, payload.sponsor_id)
        .await
        .map_err(ServiceError::into_http)?;
    Ok(Json(json!({ "message": "Sponsor updated." })))
}

#[instrument(skip(state, _auth, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "The new password is required.".to_string(),
        ));
    }
    let hash = hash_password(&payload.password).map_err(internal)?;
    repo::update_password(&state.db, id, &hash)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "Password updated." })))
}

#[instrument(skip(state, _auth))]
pub async fn record_relapse(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    repo::reset_sobriety(&state.db, id).await.map_err(internal)?;
    Ok(Json(json!({ "message": "Sobriety date reset." })))
}

#[instrument(skip(state, _auth))]
pub async fn set_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SetStatusRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.status != STATUS_ACTIVE && payload.status != STATUS_INACTIVE {
        return Err((StatusCode::BAD_REQUEST, "Unknown status.".to_string()));
    }
    repo::set_status(&state.db, id, payload.status)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "Member status updated." })))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "member operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
