use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use tracing::info;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GroupSession {
    pub id: i64,
    pub topic: String,
    pub description: Option<String>,
    pub scheduled_at: OffsetDateTime,
    pub location_id: Option<i64>,
    pub status: i16,
}

/// Listing row with the location name joined in.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionSummary {
    pub id: i64,
    pub topic: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
}

pub async fn list(db: &PgPool) -> Result<Vec<SessionSummary>, sqlx::Error> {
    sqlx::query_as::<_, SessionSummary>(
        r#"
        SELECT s.id, s.topic, s.description, u.name AS location, s.scheduled_at
        FROM group_sessions s
        LEFT JOIN locations u ON s.location_id = u.id
        ORDER BY s.scheduled_at DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn get(db: &PgPool, session_id: i64) -> Result<Option<GroupSession>, sqlx::Error> {
    sqlx::query_as::<_, GroupSession>(
        r#"
        SELECT id, topic, description, scheduled_at, location_id, status
        FROM group_sessions
        WHERE id = $1
        "#,
    )
    .bind(session_id)
    .fetch_optional(db)
    .await
}

pub async fn insert<'e, E>(
    executor: E,
    topic: &str,
    scheduled_at: OffsetDateTime,
    description: Option<&str>,
    location_id: Option<i64>,
) -> Result<GroupSession, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, GroupSession>(
        r#"
        INSERT INTO group_sessions (topic, scheduled_at, description, location_id, status)
        VALUES ($1, $2, $3, $4, 1)
        RETURNING id, topic, description, scheduled_at, location_id, status
        "#,
    )
    .bind(topic)
    .bind(scheduled_at)
    .bind(description)
    .bind(location_id)
    .fetch_one(executor)
    .await
}

pub async fn active_member_ids<'e, E>(executor: E) -> Result<Vec<i64>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT id FROM members WHERE status = 1 ORDER BY id")
        .fetch_all(executor)
        .await
}

pub async fn attendee_ids(db: &PgPool, session_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT member_id FROM attendance WHERE session_id = $1")
        .bind(session_id)
        .fetch_all(db)
        .await
}

/// Replaces the full attendance set for a session: wipe, then re-insert
/// the given members, all in one transaction.
pub async fn replace_attendance(
    db: &PgPool,
    session_id: i64,
    member_ids: &[i64],
) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM attendance WHERE session_id = $1")
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

    for member_id in member_ids {
        sqlx::query("INSERT INTO attendance (session_id, member_id, status) VALUES ($1, $2, 1)")
            .bind(session_id)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(session_id, attendees = member_ids.len(), "attendance saved");
    Ok(())
}

pub async fn list_locations(db: &PgPool) -> Result<Vec<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>("SELECT id, name FROM locations ORDER BY name")
        .fetch_all(db)
        .await
}
