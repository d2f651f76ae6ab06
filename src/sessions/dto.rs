use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub topic: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub scheduled_at: Option<OffsetDateTime>,
    pub description: Option<String>,
    pub location_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAttendanceRequest {
    pub member_ids: Vec<i64>,
}
