use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::jwt::AuthUser,
    reports::{
        dto::{AttendanceSeries, DashboardStats, EvaluationReport, GlobalReport},
        repo::{self, AttendedSession},
    },
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/attendance/:member_id", get(attendance_history))
        .route("/reports/evaluation/:member_id", get(evaluation))
        .route("/reports/global", get(global_report))
        .route("/stats/dashboard", get(dashboard))
        .route("/stats/attendance-monthly", get(monthly_attendance))
}

#[instrument(skip(state, _auth))]
pub async fn attendance_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<Vec<AttendedSession>>, (StatusCode, String)> {
    let history = repo::attendance_history(&state.db, member_id)
        .await
        .map_err(internal)?;
    Ok(Json(history))
}

/// Participation over the last 90 days plus the member's recovery
/// profile, for the coordinator's evaluation view.
#[instrument(skip(state, _auth))]
pub async fn evaluation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<EvaluationReport>, (StatusCode, String)> {
    let profile = repo::member_profile(&state.db, member_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Member not found.".to_string()))?;

    let sessions_last_90_days = repo::sessions_last_90_days(&state.db)
        .await
        .map_err(internal)?;
    let attended_last_90_days = repo::attended_last_90_days(&state.db, member_id)
        .await
        .map_err(internal)?;
    let last_attended_at = repo::last_attended_at(&state.db, member_id)
        .await
        .map_err(internal)?;

    Ok(Json(EvaluationReport {
        sessions_last_90_days,
        attended_last_90_days,
        last_attended_at,
        sober_since: profile.sober_since,
        days_sober: profile.days_sober,
        current_step: profile.current_step,
    }))
}

/// Group-wide picture for the administrator's reports page: step
/// distribution, six-month retention, and attendance averages.
#[instrument(skip(state, _auth))]
pub async fn global_report(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<GlobalReport>, (StatusCode, String)> {
    let steps = repo::step_distribution(&state.db).await.map_err(internal)?;
    let retention = repo::retention_by_month(&state.db).await.map_err(internal)?;
    let average_attendance = repo::average_attendance(&state.db).await.map_err(internal)?;
    let past_sessions = repo::past_session_count(&state.db).await.map_err(internal)?;
    let active_members = repo::active_member_count(&state.db).await.map_err(internal)?;
    let inactive_members = repo::inactive_member_count(&state.db)
        .await
        .map_err(internal)?;

    Ok(Json(GlobalReport {
        steps,
        retention,
        average_attendance,
        past_sessions,
        active_members,
        inactive_members,
    }))
}

#[instrument(skip(state, _auth))]
pub async fn monthly_attendance(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<AttendanceSeries>, (StatusCode, String)> {
    let rows = repo::monthly_attendance(&state.db).await.map_err(internal)?;
    Ok(Json(AttendanceSeries::from_rows(rows)))
}

#[instrument(skip(state, _auth))]
pub async fn dashboard(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<DashboardStats>, (StatusCode, String)> {
    let active_members = repo::active_member_count(&state.db)
        .await
        .map_err(internal)?;
    let attendance_today = repo::attendance_today(&state.db).await.map_err(internal)?;
    let new_this_week = repo::new_members_this_week(&state.db)
        .await
        .map_err(internal)?;
    let next_session = repo::next_session(&state.db).await.map_err(internal)?;

    Ok(Json(DashboardStats {
        active_members,
        attendance_today,
        new_this_week,
        next_session,
    }))
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "report query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
