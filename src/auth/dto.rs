use serde::{Deserialize, Serialize};

use crate::auth::jwt::Role;

/// Login body. `identifier` is a staff email or, for anonymous members,
/// a confidential code such as `AA17`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub alias: String,
    pub role: Role,
    /// The member's current sponsor or, failing that, one of their
    /// sponsees; the client opens the chat view on this partner.
    pub chat_partner_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_serializes_role_lowercase() {
        let response = LoginResponse {
            token: "t".into(),
            user: AuthenticatedUser {
                id: 3,
                alias: "Luna".into(),
                role: Role::Member,
                chat_partner_id: Some(9),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""role":"member""#));
        assert!(json.contains(r#""chat_partner_id":9"#));
    }
}
