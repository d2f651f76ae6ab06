use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{error, instrument, warn};

use crate::{
    auth::jwt::{AuthUser, Role},
    error::ServiceError,
    state::AppState,
    testimonials::{
        dto::{CreateTestimonialRequest, ReactRequest},
        repo::{self, Testimonial, TestimonialView},
    },
};

/// Only the author or an administrator may remove a post.
fn ensure_can_delete(author_id: i64, requester_id: i64, role: Role) -> Result<(), ServiceError> {
    if author_id != requester_id && role != Role::Administrator {
        return Err(ServiceError::Forbidden(
            "You do not have permission to delete this post.".into(),
        ));
    }
    Ok(())
}

pub fn testimonial_routes() -> Router<AppState> {
    Router::new()
        .route("/testimonials/feed/:viewer_id", get(list_testimonials))
        .route("/testimonials", post(create_testimonial))
        .route("/testimonials/:id/react", post(react))
        .route("/testimonials/:id", delete(delete_testimonial))
}

#[instrument(skip(state, _auth))]
pub async fn list_testimonials(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(viewer_id): Path<i64>,
) -> Result<Json<Vec<TestimonialView>>, (StatusCode, String)> {
    let testimonials = repo::list_for_viewer(&state.db, viewer_id)
        .await
        .map_err(internal)?;
    Ok(Json(testimonials))
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_testimonial(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateTestimonialRequest>,
) -> Result<(StatusCode, Json<Testimonial>), (StatusCode, String)> {
    let bad_request = || {
        (
            StatusCode::BAD_REQUEST,
            "All fields are required.".to_string(),
        )
    };
    let member_id = payload.member_id.ok_or_else(bad_request)?;
    let title = payload
        .title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(bad_request)?;
    let content = payload
        .content
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(bad_request)?;

    let testimonial = repo::create(&state.db, member_id, title, content)
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(testimonial)))
}

#[instrument(skip(state, _auth))]
pub async fn react(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReactRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    repo::react(&state.db, id, payload.member_id, payload.kind)
        .await
        .map_err(internal)?;
    Ok(Json(json!({ "message": "Reaction updated." })))
}

#[instrument(skip(state, auth))]
pub async fn delete_testimonial(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let author_id = repo::author_of(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "The testimonial does not exist.".to_string(),
        ))?;

    ensure_can_delete(author_id, auth.id, auth.role).map_err(|e| {
        warn!(
            testimonial_id = id,
            requester = auth.id,
            "testimonial delete denied"
        );
        e.into_http()
    })?;

    repo::delete(&state.db, id).await.map_err(internal)?;
    Ok(Json(json!({ "message": "Testimonial deleted." })))
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    error!(error = %e, "testimonial storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_may_delete_own_post() {
        assert!(ensure_can_delete(5, 5, Role::Member).is_ok());
    }

    #[test]
    fn administrator_may_delete_any_post() {
        assert!(ensure_can_delete(5, 1, Role::Administrator).is_ok());
    }

    #[test]
    fn others_are_denied() {
        assert!(matches!(
            ensure_can_delete(5, 6, Role::Member),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            ensure_can_delete(5, 6, Role::Coordinator),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
