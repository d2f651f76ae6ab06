use serde::{Deserialize, Serialize};
use time::Date;

use crate::members::repo::MemberSummary;
use crate::sponsorship::repo::Partner;

#[derive(Debug, Deserialize)]
pub struct CreateMemberRequest {
    pub alias: String,
    pub joined_on: Date,
    pub sober_since: Date,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberFilter {
    /// `active` or `inactive`; anything else (or absent) lists everyone.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecordStepRequest {
    pub step: i32,
}

#[derive(Debug, Deserialize)]
pub struct AssignSponsorRequest {
    /// `null` removes the current sponsor without assigning a new one.
    pub sponsor_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: i16,
}

#[derive(Debug, Serialize)]
pub struct MemberDetails {
    #[serde(flatten)]
    pub member: MemberSummary,
    pub sponsees: Vec<Partner>,
}
