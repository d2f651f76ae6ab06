use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::ServiceError,
    messaging::{
        dto::{ConversationMessage, SendMessageRequest, SentMessage},
        services,
    },
    sponsorship::repo::Partner,
    state::AppState,
};

pub fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/partners/:member_id", get(list_partners))
        .route("/messages/:member_a/:member_b", get(list_conversation))
        .route("/messages", post(send_message))
}

#[instrument(skip(state, _auth))]
pub async fn list_partners(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(member_id): Path<i64>,
) -> Result<Json<Vec<Partner>>, (StatusCode, String)> {
    let partners = services::list_partners(&state, member_id)
        .await
        .map_err(ServiceError::into_http)?;
    Ok(Json(partners))
}

#[instrument(skip(state, _auth))]
pub async fn list_conversation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((member_a, member_b)): Path<(i64, i64)>,
) -> Result<Json<Vec<ConversationMessage>>, (StatusCode, String)> {
    let conversation = services::list_conversation(&state, member_a, member_b)
        .await
        .map_err(ServiceError::into_http)?;
    Ok(Json(conversation))
}

#[instrument(skip(state, _auth, payload))]
pub async fn send_message(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<SentMessage>), (StatusCode, String)> {
    let sent = services::send(&state, &payload)
        .await
        .map_err(ServiceError::into_http)?;
    Ok((StatusCode::CREATED, Json(sent)))
}
