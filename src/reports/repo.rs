use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendedSession {
    pub session_id: i64,
    pub topic: String,
    pub scheduled_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UpcomingSession {
    pub topic: String,
    pub scheduled_at: OffsetDateTime,
    pub location: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MemberProfile {
    pub sober_since: Date,
    pub days_sober: i64,
    pub current_step: Option<i32>,
}

pub async fn attendance_history(
    db: &PgPool,
    member_id: i64,
) -> Result<Vec<AttendedSession>, sqlx::Error> {
    sqlx::query_as::<_, AttendedSession>(
        r#"
        SELECT s.id AS session_id, s.topic, s.scheduled_at
        FROM attendance a
        JOIN group_sessions s ON a.session_id = s.id
        WHERE a.member_id = $1
        ORDER BY s.scheduled_at DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await
}

pub async fn sessions_last_90_days(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM group_sessions WHERE scheduled_at >= now() - INTERVAL '90 days'",
    )
    .fetch_one(db)
    .await
}

pub async fn attended_last_90_days(db: &PgPool, member_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(a.id)
        FROM attendance a
        JOIN group_sessions s ON a.session_id = s.id
        WHERE a.member_id = $1 AND s.scheduled_at >= now() - INTERVAL '90 days'
        "#,
    )
    .bind(member_id)
    .fetch_one(db)
    .await
}

pub async fn last_attended_at(
    db: &PgPool,
    member_id: i64,
) -> Result<Option<OffsetDateTime>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<OffsetDateTime>>(
        r#"
        SELECT MAX(s.scheduled_at)
        FROM attendance a
        JOIN group_sessions s ON a.session_id = s.id
        WHERE a.member_id = $1
        "#,
    )
    .bind(member_id)
    .fetch_one(db)
    .await
}

pub async fn member_profile(
    db: &PgPool,
    member_id: i64,
) -> Result<Option<MemberProfile>, sqlx::Error> {
    sqlx::query_as::<_, MemberProfile>(
        r#"
        SELECT m.sober_since,
               (CURRENT_DATE - m.sober_since)::BIGINT AS days_sober,
               p.step AS current_step
        FROM members m
        LEFT JOIN (
            SELECT DISTINCT ON (member_id) member_id, step
            FROM progress
            ORDER BY member_id, recorded_on DESC, id DESC
        ) p ON m.id = p.member_id
        WHERE m.id = $1
        "#,
    )
    .bind(member_id)
    .fetch_optional(db)
    .await
}

pub async fn active_member_count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE status = 1")
        .fetch_one(db)
        .await
}

pub async fn attendance_today(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(DISTINCT member_id) FROM attendance
        WHERE session_id IN (
            SELECT id FROM group_sessions WHERE DATE(scheduled_at) = CURRENT_DATE
        )
        "#,
    )
    .fetch_one(db)
    .await
}

pub async fn new_members_this_week(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM members WHERE joined_on >= date_trunc('week', CURRENT_DATE)",
    )
    .fetch_one(db)
    .await
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StepCount {
    pub step: i32,
    pub members: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RetentionMonth {
    pub month: String,
    pub joined: i64,
    pub dropped: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionAttendanceRow {
    pub session_id: i64,
    pub topic: String,
    pub held_on: String,
    pub attendees: i64,
}

/// How many members currently stand at each step, taking the highest
/// step each member has recorded.
pub async fn step_distribution(db: &PgPool) -> Result<Vec<StepCount>, sqlx::Error> {
    sqlx::query_as::<_, StepCount>(
        r#"
        SELECT p.step, COUNT(*)::BIGINT AS members
        FROM (
            SELECT member_id, MAX(step) AS step
            FROM progress
            GROUP BY member_id
        ) p
        GROUP BY p.step
        ORDER BY p.step
        "#,
    )
    .fetch_all(db)
    .await
}

/// Joins and drops per month over the last six months, including the
/// current one. Months with no movement still appear with zeros.
pub async fn retention_by_month(db: &PgPool) -> Result<Vec<RetentionMonth>, sqlx::Error> {
    sqlx::query_as::<_, RetentionMonth>(
        r#"
        WITH months AS (
            SELECT generate_series(
                date_trunc('month', now() - INTERVAL '5 months'),
                date_trunc('month', now()),
                '1 month'
            ) AS month
        )
        SELECT TO_CHAR(mo.month, 'Mon YYYY') AS month,
               (SELECT COUNT(*) FROM members m
                WHERE date_trunc('month', m.joined_on::TIMESTAMPTZ) = mo.month)::BIGINT AS joined,
               (SELECT COUNT(*) FROM members m
                WHERE m.status = 2
                  AND date_trunc('month', m.status_changed_at) = mo.month)::BIGINT AS dropped
        FROM months mo
        ORDER BY mo.month
        "#,
    )
    .fetch_all(db)
    .await
}

/// Average attendee count across sessions that had any attendance.
pub async fn average_attendance(db: &PgPool) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(AVG(per_session.attendees), 0)::DOUBLE PRECISION
        FROM (
            SELECT COUNT(*) AS attendees
            FROM attendance
            GROUP BY session_id
        ) per_session
        "#,
    )
    .fetch_one(db)
    .await
}

pub async fn past_session_count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM group_sessions WHERE scheduled_at < now()")
        .fetch_one(db)
        .await
}

pub async fn inactive_member_count(db: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE status = 2")
        .fetch_one(db)
        .await
}

/// Attendee counts per session over the last 30 days, oldest first.
pub async fn monthly_attendance(db: &PgPool) -> Result<Vec<SessionAttendanceRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionAttendanceRow>(
        r#"
        SELECT s.id AS session_id,
               s.topic,
               TO_CHAR(s.scheduled_at, 'DD Mon') AS held_on,
               COUNT(a.id)::BIGINT AS attendees
        FROM group_sessions s
        LEFT JOIN attendance a ON a.session_id = s.id
        WHERE s.scheduled_at >= now() - INTERVAL '30 days'
          AND s.scheduled_at <= now()
        GROUP BY s.id, s.topic, s.scheduled_at
        ORDER BY s.scheduled_at ASC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn next_session(db: &PgPool) -> Result<Option<UpcomingSession>, sqlx::Error> {
    sqlx::query_as::<_, UpcomingSession>(
        r#"
        SELECT s.topic, s.scheduled_at, u.name AS location
        FROM group_sessions s
        LEFT JOIN locations u ON s.location_id = u.id
        WHERE s.scheduled_at >= now()
        ORDER BY s.scheduled_at ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(db)
    .await
}
