use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::info;

use crate::testimonials::dto::ReactionKind;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Testimonial {
    pub id: i64,
    pub member_id: i64,
    pub title: String,
    pub content: String,
    pub published_at: OffsetDateTime,
}

/// Listing row: authors appear by confidential code, never alias, plus
/// per-kind reaction counts and the viewing member's own reaction.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestimonialView {
    pub id: i64,
    pub member_id: i64,
    pub author_code: String,
    pub title: String,
    pub content: String,
    pub published_at: OffsetDateTime,
    pub support_count: i64,
    pub inspiration_count: i64,
    pub gratitude_count: i64,
    pub viewer_reaction: Option<String>,
}

pub async fn list_for_viewer(
    db: &PgPool,
    viewer_id: i64,
) -> Result<Vec<TestimonialView>, sqlx::Error> {
    sqlx::query_as::<_, TestimonialView>(
        r#"
        SELECT
            t.id, t.member_id, m.code AS author_code, t.title, t.content, t.published_at,
            (SELECT COUNT(*) FROM testimonial_reactions
             WHERE testimonial_id = t.id AND kind = 'support') AS support_count,
            (SELECT COUNT(*) FROM testimonial_reactions
             WHERE testimonial_id = t.id AND kind = 'inspiration') AS inspiration_count,
            (SELECT COUNT(*) FROM testimonial_reactions
             WHERE testimonial_id = t.id AND kind = 'gratitude') AS gratitude_count,
            (SELECT kind FROM testimonial_reactions
             WHERE testimonial_id = t.id AND member_id = $1) AS viewer_reaction
        FROM testimonials t
        JOIN members m ON t.member_id = m.id
        ORDER BY t.published_at DESC
        "#,
    )
    .bind(viewer_id)
    .fetch_all(db)
    .await
}

pub async fn create(
    db: &PgPool,
    member_id: i64,
    title: &str,
    content: &str,
) -> Result<Testimonial, sqlx::Error> {
    sqlx::query_as::<_, Testimonial>(
        r#"
        INSERT INTO testimonials (member_id, title, content)
        VALUES ($1, $2, $3)
        RETURNING id, member_id, title, content, published_at
        "#,
    )
    .bind(member_id)
    .bind(title)
    .bind(content)
    .fetch_one(db)
    .await
}

/// Toggle semantics: reacting with the member's current kind removes
/// it; any other kind replaces it. A member never holds more than one
/// reaction per testimonial.
pub async fn react(
    db: &PgPool,
    testimonial_id: i64,
    member_id: i64,
    kind: ReactionKind,
) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    let existing_same = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM testimonial_reactions
        WHERE testimonial_id = $1 AND member_id = $2 AND kind = $3
        "#,
    )
    .bind(testimonial_id)
    .bind(member_id)
    .bind(kind.as_str())
    .fetch_optional(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM testimonial_reactions WHERE testimonial_id = $1 AND member_id = $2")
        .bind(testimonial_id)
        .bind(member_id)
        .execute(&mut *tx)
        .await?;

    if existing_same.is_none() {
        sqlx::query(
            r#"
            INSERT INTO testimonial_reactions (testimonial_id, member_id, kind)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(testimonial_id)
        .bind(member_id)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn author_of(db: &PgPool, testimonial_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT member_id FROM testimonials WHERE id = $1")
        .bind(testimonial_id)
        .fetch_optional(db)
        .await
}

/// Reactions go first so the foreign key never blocks the delete.
pub async fn delete(db: &PgPool, testimonial_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("DELETE FROM testimonial_reactions WHERE testimonial_id = $1")
        .bind(testimonial_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM testimonials WHERE id = $1")
        .bind(testimonial_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(testimonial_id, "testimonial deleted");
    Ok(())
}
