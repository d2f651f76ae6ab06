use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub body_ciphertext: String,
    pub sent_at: OffsetDateTime,
    pub read: bool,
}

/// All messages between the pair in either direction, oldest first.
/// The serial id breaks ties between identical timestamps.
pub async fn fetch_conversation(
    db: &PgPool,
    member_a: i64,
    member_b: i64,
) -> Result<Vec<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT id, sender_id, recipient_id, body_ciphertext, sent_at, read
        FROM messages
        WHERE (sender_id = $1 AND recipient_id = $2)
           OR (sender_id = $2 AND recipient_id = $1)
        ORDER BY sent_at ASC, id ASC
        "#,
    )
    .bind(member_a)
    .bind(member_b)
    .fetch_all(db)
    .await
}

pub async fn insert_message<'e, E>(
    executor: E,
    sender_id: i64,
    recipient_id: i64,
    body_ciphertext: &str,
) -> Result<MessageRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages (sender_id, recipient_id, body_ciphertext)
        VALUES ($1, $2, $3)
        RETURNING id, sender_id, recipient_id, body_ciphertext, sent_at, read
        "#,
    )
    .bind(sender_id)
    .bind(recipient_id)
    .bind(body_ciphertext)
    .fetch_one(executor)
    .await
}

pub async fn member_alias<'e, E>(executor: E, member_id: i64) -> Result<Option<String>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, String>("SELECT alias FROM members WHERE id = $1")
        .bind(member_id)
        .fetch_optional(executor)
        .await
}
