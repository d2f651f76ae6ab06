use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::{
    auth::jwt::AuthUser,
    error::ServiceError,
    sessions::{
        dto::{CreateSessionRequest, SaveAttendanceRequest},
        repo::{self, GroupSession, Location, SessionSummary},
        services,
    },
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/:id", get(get_session))
        .route(
            "/sessions/:id/attendance",
            get(get_attendance).put(save_attendance),
        )
        .route("/locations", get(list_locations))
}

#[instrument(skip(state, _auth))]
pub async fn list_sessions(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<SessionSummary>>, (StatusCode, String)> {
    let sessions = repo::list(&state.db).await.map_err(internal)?;
    Ok(Json(sessions))
}

#[instrument(skip(state, _auth))]
pub async fn get_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<GroupSession>, (StatusCode, String)> {
    let session = repo::get(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Session not found.".to_string()))?;
    Ok(Json(session))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_session(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<GroupSession>), (StatusCode, String)> {
    let session = services::create_session(&state, &payload)
        .await
        .map_err(ServiceError::into_http)?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[instrument(skip(state, _auth))]
pub async fn get_attendance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<i64>>, (StatusCode, String)> {
    let ids = repo::attendee_ids(&state.db, id).await.map_err(internal)?;
    Ok(Json(ids))
}

#[instrument(skip(state, _auth, payload))]
pub async fn save_attendance(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<SaveAttendanceRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    repo::replace_attendance(&state.db, id, &payload.member_ids)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "Attendance saved." })))
}

#[instrument(skip(state, _auth))]
pub async fn list_locations(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Location>>, (StatusCode, String)> {
    let locations = repo::list_locations(&state.db).await.map_err(internal)?;
    Ok(Json(locations))
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "session storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
