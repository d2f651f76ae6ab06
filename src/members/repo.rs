use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::Date;
use tracing::info;

use crate::sponsorship::repo::Partner;

pub const STATUS_ACTIVE: i16 = 1;
pub const STATUS_INACTIVE: i16 = 2;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub code: String,
    pub alias: String,
    pub joined_on: Date,
    pub sober_since: Date,
    pub status: i16,
}

/// Listing row with the display attributes the roster view needs.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MemberSummary {
    pub id: i64,
    pub code: String,
    pub alias: String,
    pub joined_on: Date,
    pub sober_since: Date,
    pub status: i16,
    pub sponsor_id: Option<i64>,
    pub sponsor_alias: Option<String>,
    pub days_sober: i64,
    pub current_step: Option<i32>,
}

const SUMMARY_SELECT: &str = r#"
    SELECT m.id, m.code, m.alias, m.joined_on, m.sober_since, m.status,
           l.sponsor_id, sp.alias AS sponsor_alias,
           (CURRENT_DATE - m.sober_since)::BIGINT AS days_sober,
           p.step AS current_step
    FROM members m
    LEFT JOIN sponsor_links l ON m.id = l.sponsee_id AND l.ended_on IS NULL
    LEFT JOIN members sp ON l.sponsor_id = sp.id
    LEFT JOIN (
        SELECT DISTINCT ON (member_id) member_id, step
        FROM progress
        ORDER BY member_id, recorded_on DESC, id DESC
    ) p ON m.id = p.member_id
"#;

pub async fn list(db: &PgPool, status: Option<i16>) -> Result<Vec<MemberSummary>, sqlx::Error> {
    let query = format!(
        "{SUMMARY_SELECT} WHERE ($1::SMALLINT IS NULL OR m.status = $1) ORDER BY m.alias ASC"
    );
    sqlx::query_as::<_, MemberSummary>(&query)
        .bind(status)
        .fetch_all(db)
        .await
}

pub async fn get(db: &PgPool, member_id: i64) -> Result<Option<MemberSummary>, sqlx::Error> {
    let query = format!("{SUMMARY_SELECT} WHERE m.id = $1");
    sqlx::query_as::<_, MemberSummary>(&query)
        .bind(member_id)
        .fetch_optional(db)
        .await
}

pub async fn open_sponsees_of(db: &PgPool, member_id: i64) -> Result<Vec<Partner>, sqlx::Error> {
    sqlx::query_as::<_, Partner>(
        r#"
        SELECT s.id AS member_id, s.alias, s.code
        FROM sponsor_links l
        JOIN members s ON l.sponsee_id = s.id
        WHERE l.sponsor_id = $1 AND l.ended_on IS NULL
        ORDER BY s.alias
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await
}

/// Inserts the member with a placeholder code, patches it to the
/// derived `AA{id}` and records the initial step, all in one
/// transaction. No row ever outlives the placeholder.
pub async fn create(
    db: &PgPool,
    alias: &str,
    joined_on: Date,
    sober_since: Date,
    password_hash: &str,
) -> Result<Member, sqlx::Error> {
    let mut tx = db.begin().await?;

    let new_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO members (code, alias, joined_on, sober_since, status, password_hash)
        VALUES ('PENDING', $1, $2, $3, 1, $4)
        RETURNING id
        "#,
    )
    .bind(alias)
    .bind(joined_on)
    .bind(sober_since)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await?;

    let member = sqlx::query_as::<_, Member>(
        r#"
        UPDATE members SET code = $1
        WHERE id = $2
        RETURNING id, code, alias, joined_on, sober_since, status
        "#,
    )
    .bind(format!("AA{new_id}"))
    .bind(new_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO progress (member_id, step, recorded_on) VALUES ($1, 1, CURRENT_DATE)")
        .bind(new_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(member_id = member.id, code = %member.code, "member registered");
    Ok(member)
}

pub async fn record_step(db: &PgPool, member_id: i64, step: i32) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO progress (member_id, step, recorded_on) VALUES ($1, $2, CURRENT_DATE)")
        .bind(member_id)
        .bind(step)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn update_password(
    db: &PgPool,
    member_id: i64,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(member_id)
        .execute(db)
        .await?;
    Ok(())
}

/// A relapse resets the sobriety date to today.
pub async fn reset_sobriety(db: &PgPool, member_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET sober_since = CURRENT_DATE WHERE id = $1")
        .bind(member_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn set_status(db: &PgPool, member_id: i64, status: i16) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE members SET status = $1, status_changed_at = now() WHERE id = $2")
        .bind(status)
        .bind(member_id)
        .execute(db)
        .await?;
    Ok(())
}
