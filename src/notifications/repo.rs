use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub recipient_id: i64,
    pub text: String,
    pub link: String,
    pub created_at: OffsetDateTime,
    pub read: bool,
}

/// Inserts a notification on any executor so callers can make it part
/// of their own transaction (message send, session fan-out).
pub async fn notify<'e, E>(
    executor: E,
    recipient_id: i64,
    text: &str,
    link: &str,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO notifications (recipient_id, text, link)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(recipient_id)
    .bind(text)
    .bind(link)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_unread(db: &PgPool, member_id: i64) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, recipient_id, text, link, created_at, read
        FROM notifications
        WHERE recipient_id = $1 AND read = false
        ORDER BY created_at DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await
}

/// Idempotent: re-marking an already-read notification is a no-op.
pub async fn mark_read(db: &PgPool, notification_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notifications SET read = true WHERE id = $1")
        .bind(notification_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn mark_all_read(db: &PgPool, member_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE notifications SET read = true WHERE recipient_id = $1")
        .bind(member_id)
        .execute(db)
        .await?;
    Ok(())
}
