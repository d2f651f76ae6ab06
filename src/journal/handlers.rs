use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, instrument};

use crate::{
    auth::jwt::AuthUser,
    journal::repo::{self, JournalEntry},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub member_id: Option<i64>,
    pub reflection: Option<String>,
}

pub fn journal_routes() -> Router<AppState> {
    Router::new()
        .route("/journal/:member_id", get(list_entries))
        .route("/journal", post(create_entry))
}

#[instrument(skip(state, _auth))]
pub async fn list_entries(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<Vec<JournalEntry>>, (StatusCode, String)> {
    let entries = repo::list_for_member(&state.db, member_id)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<JournalEntry>), (StatusCode, String)> {
    let member_id = payload.member_id.ok_or((
        StatusCode::BAD_REQUEST,
        "A member id and a reflection are required.".to_string(),
    ))?;
    let reflection = payload
        .reflection
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .ok_or((
            StatusCode::BAD_REQUEST,
            "A member id and a reflection are required.".to_string(),
        ))?;

    let entry = repo::create(&state.db, member_id, reflection)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "journal storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
