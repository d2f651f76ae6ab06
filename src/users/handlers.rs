use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, instrument, warn};

use crate::{
    auth::{jwt::AuthUser, password::hash_password},
    state::AppState,
    users::{
        dto::{CreateStaffRequest, PublicStaffUser},
        repo::{self, RoleRow},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_staff_user))
        .route("/roles", get(list_roles))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, _auth, payload))]
pub async fn create_staff_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(mut payload): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<PublicStaffUser>), (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.full_name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "All fields are required.".to_string(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid staff email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("staff password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    let hash = hash_password(&payload.password).map_err(internal)?;

    let user = match repo::create(
        &state.db,
        payload.full_name.trim(),
        &payload.email,
        &hash,
        payload.role_id,
    )
    .await
    {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err((
                StatusCode::CONFLICT,
                "The email address is already registered.".into(),
            ));
        }
        Err(e) => return Err(internal(e)),
    };

    Ok((
        StatusCode::CREATED,
        Json(PublicStaffUser {
            id: user.id,
            code: user.code,
            full_name: user.full_name,
            email: user.email,
            role_id: user.role_id,
        }),
    ))
}

#[instrument(skip(state, _auth))]
pub async fn list_roles(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<RoleRow>>, (StatusCode, String)> {
    let roles = repo::list_roles(&state.db).await.map_err(internal)?;
    Ok(Json(roles))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "staff user operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(is_valid_email("coordinator@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn rejects_codes_and_garbage() {
        assert!(!is_valid_email("AA17"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
    }
}
