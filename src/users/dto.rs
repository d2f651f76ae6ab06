use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateStaffRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role_id: i64,
}

/// Public part of a staff account; the hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct PublicStaffUser {
    pub id: i64,
    pub code: String,
    pub full_name: String,
    pub email: String,
    pub role_id: i64,
}
