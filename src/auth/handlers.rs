use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthenticatedUser, LoginRequest, LoginResponse},
        jwt::{JwtKeys, Role},
        password::verify_password,
        repo,
    },
    sponsorship,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Single login endpoint: staff sign in with an email address, members
/// with their confidential code. The presence of `@` decides which.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, String)> {
    payload.identifier = payload.identifier.trim().to_string();

    if payload.identifier.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Identifier and password are required.".into(),
        ));
    }

    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid credentials.".to_string());

    let (subject_id, alias, role, chat_partner_id) = if payload.identifier.contains('@') {
        let account =
            repo::find_active_staff_by_email(&state.db, &payload.identifier.to_lowercase())
                .await
                .map_err(internal)?
                .ok_or_else(|| {
                    warn!("login with unknown staff email");
                    invalid()
                })?;

        if !verify_password(&payload.password, &account.password_hash).map_err(internal)? {
            warn!(staff_id = account.id, "staff login invalid password");
            return Err(invalid());
        }

        let role = Role::from_role_name(&account.role_name).ok_or_else(|| {
            error!(staff_id = account.id, role = %account.role_name, "unknown staff role");
            internal(anyhow::anyhow!("unknown role"))
        })?;

        (account.id, account.full_name, role, None)
    } else {
        let account = repo::find_active_member_by_code(&state.db, &payload.identifier)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                warn!("login with unknown member code");
                invalid()
            })?;

        if !verify_password(&payload.password, &account.password_hash).map_err(internal)? {
            warn!(member_id = account.id, "member login invalid password");
            return Err(invalid());
        }

        let sponsor = sponsorship::repo::current_sponsor_of(&state.db, account.id)
            .await
            .map_err(internal)?;
        let chat_partner = match sponsor {
            Some(id) => Some(id),
            None => sponsorship::repo::current_sponsees_of(&state.db, account.id)
                .await
                .map_err(internal)?
                .first()
                .copied(),
        };

        (account.id, account.alias, Role::Member, chat_partner)
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(subject_id, role).map_err(internal)?;

    info!(subject_id, role = ?role, "login succeeded");
    Ok(Json(LoginResponse {
        token,
        user: AuthenticatedUser {
            id: subject_id,
            alias,
            role,
            chat_partner_id,
        },
    }))
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "auth failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.".into(),
    )
}
