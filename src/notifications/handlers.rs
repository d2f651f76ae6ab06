use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::{
    auth::jwt::AuthUser,
    notifications::repo::{self, Notification},
    state::AppState,
};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/:member_id", get(list_unread))
        .route("/notifications/:id/read", put(mark_read))
        .route("/notifications/read-all/:member_id", put(mark_all_read))
}

#[instrument(skip(state, _auth))]
pub async fn list_unread(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<Vec<Notification>>, (StatusCode, String)> {
    let notifications = repo::list_unread(&state.db, member_id)
        .await
        .map_err(internal)?;
    Ok(Json(notifications))
}

#[instrument(skip(state, _auth))]
pub async fn mark_read(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    repo::mark_read(&state.db, id).await.map_err(internal)?;
    Ok(Json(json!({ "message": "Notification marked as read." })))
}

#[instrument(skip(state, _auth))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    repo::mark_all_read(&state.db, member_id)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "All notifications marked as read." })))
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "notification storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
