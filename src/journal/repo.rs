use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JournalEntry {
    pub id: i64,
    pub member_id: i64,
    pub reflection: String,
    pub recorded_at: OffsetDateTime,
}

pub async fn list_for_member(
    db: &PgPool,
    member_id: i64,
) -> Result<Vec<JournalEntry>, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(
        r#"
        SELECT id, member_id, reflection, recorded_at
        FROM journal_entries
        WHERE member_id = $1
        ORDER BY recorded_at DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await
}

pub async fn create(
    db: &PgPool,
    member_id: i64,
    reflection: &str,
) -> Result<JournalEntry, sqlx::Error> {
    sqlx::query_as::<_, JournalEntry>(
        r#"
        INSERT INTO journal_entries (member_id, reflection)
        VALUES ($1, $2)
        RETURNING id, member_id, reflection, recorded_at
        "#,
    )
    .bind(member_id)
    .bind(reflection)
    .fetch_one(db)
    .await
}
