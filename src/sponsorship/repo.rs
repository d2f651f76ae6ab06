use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::error::ServiceError;

/// A member reachable through an open sponsor link, with the display
/// attributes the chat list needs.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Partner {
    pub member_id: i64,
    pub alias: String,
    pub code: String,
}

/// A link is current iff it has no end date.
pub async fn current_sponsor_of(db: &PgPool, member_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT sponsor_id
        FROM sponsor_links
        WHERE sponsee_id = $1 AND ended_on IS NULL
        "#,
    )
    .bind(member_id)
    .fetch_optional(db)
    .await
}

pub async fn current_sponsees_of(db: &PgPool, member_id: i64) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT sponsee_id
        FROM sponsor_links
        WHERE sponsor_id = $1 AND ended_on IS NULL
        ORDER BY sponsee_id
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await
}

/// Union of the current sponsor and all current sponsees, deduplicated
/// and excluding the member itself.
pub fn merge_partner_ids(sponsor: Option<i64>, sponsees: &[i64], member_id: i64) -> Vec<i64> {
    let mut ids: Vec<i64> = sponsor.into_iter().chain(sponsees.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.retain(|&id| id != member_id);
    ids
}

pub async fn conversation_partners_of(
    db: &PgPool,
    member_id: i64,
) -> Result<Vec<Partner>, sqlx::Error> {
    let sponsor = current_sponsor_of(db, member_id).await?;
    let sponsees = current_sponsees_of(db, member_id).await?;
    let ids = merge_partner_ids(sponsor, &sponsees, member_id);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, Partner>(
        r#"
        SELECT id AS member_id, alias, code
        FROM members
        WHERE id = ANY($1)
        ORDER BY alias
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await
}

/// Closes any open edge where the member is the sponsee, then opens a
/// new one if a sponsor was given. Both steps run in one transaction so
/// concurrent reassignments cannot leave two open edges.
pub async fn reassign_sponsor(
    db: &PgPool,
    sponsee_id: i64,
    new_sponsor_id: Option<i64>,
) -> Result<(), ServiceError> {
    if new_sponsor_id == Some(sponsee_id) {
        return Err(ServiceError::validation(
            "A member cannot sponsor themselves.",
        ));
    }

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        UPDATE sponsor_links
        SET ended_on = CURRENT_DATE
        WHERE sponsee_id = $1 AND ended_on IS NULL
        "#,
    )
    .bind(sponsee_id)
    .execute(&mut *tx)
    .await?;

    if let Some(sponsor_id) = new_sponsor_id {
        sqlx::query(
            r#"
            INSERT INTO sponsor_links (sponsor_id, sponsee_id, started_on)
            VALUES ($1, $2, CURRENT_DATE)
            "#,
        )
        .bind(sponsor_id)
        .bind(sponsee_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!(sponsee_id, sponsor_id = ?new_sponsor_id, "sponsor reassigned");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_both_directions() {
        let ids = merge_partner_ids(Some(2), &[3, 4], 1);
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn merge_handles_missing_sponsor() {
        let ids = merge_partner_ids(None, &[5], 1);
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn merge_deduplicates_and_drops_self() {
        // A member sponsored by someone they also sponsor shows up once.
        let ids = merge_partner_ids(Some(2), &[2, 1], 1);
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn merge_empty_graph_is_empty() {
        assert!(merge_partner_ids(None, &[], 7).is_empty());
    }

    #[test]
    fn schema_enforces_single_open_edge_per_sponsee() {
        let schema = include_str!("../../migrations/0001_init.sql");
        assert!(schema.contains("CREATE UNIQUE INDEX sponsor_links_open_sponsee_key"));
        assert!(schema.contains("ON sponsor_links (sponsee_id) WHERE ended_on IS NULL"));
    }
}

// Run with: cargo test --features pg-tests (needs DATABASE_URL).
#[cfg(all(test, feature = "pg-tests"))]
mod pg_tests {
    use super::*;

    async fn seed_member(db: &PgPool, alias: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO members (code, alias, joined_on, sober_since, password_hash)
            VALUES ($1, $2, CURRENT_DATE, CURRENT_DATE, 'x')
            RETURNING id
            "#,
        )
        .bind(format!("AA-{alias}"))
        .bind(alias)
        .fetch_one(db)
        .await
        .expect("seed member")
    }

    async fn open_sponsors_of(db: &PgPool, sponsee_id: i64) -> Vec<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT sponsor_id FROM sponsor_links WHERE sponsee_id = $1 AND ended_on IS NULL",
        )
        .bind(sponsee_id)
        .fetch_all(db)
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn reassignment_closes_the_previous_edge(pool: PgPool) {
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;
        let carla = seed_member(&pool, "Carla").await;

        reassign_sponsor(&pool, ana, Some(bruno)).await.unwrap();
        reassign_sponsor(&pool, ana, Some(carla)).await.unwrap();

        assert_eq!(open_sponsors_of(&pool, ana).await, vec![carla]);
        assert_eq!(current_sponsor_of(&pool, ana).await.unwrap(), Some(carla));

        // The first link stays in the history with an end date.
        let closed: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sponsor_links WHERE sponsee_id = $1 AND ended_on IS NOT NULL",
        )
        .bind(ana)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(closed, 1);
    }

    #[sqlx::test]
    async fn clearing_the_sponsor_keeps_the_closed_history(pool: PgPool) {
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        reassign_sponsor(&pool, ana, Some(bruno)).await.unwrap();
        reassign_sponsor(&pool, ana, None).await.unwrap();

        assert!(open_sponsors_of(&pool, ana).await.is_empty());
        assert_eq!(current_sponsor_of(&pool, ana).await.unwrap(), None);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sponsor_links")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 1);
    }

    #[sqlx::test]
    async fn partners_are_symmetric_after_assignment(pool: PgPool) {
        let ana = seed_member(&pool, "Ana").await;
        let bruno = seed_member(&pool, "Bruno").await;

        reassign_sponsor(&pool, ana, Some(bruno)).await.unwrap();

        let of_ana = conversation_partners_of(&pool, ana).await.unwrap();
        assert_eq!(of_ana.len(), 1);
        assert_eq!(of_ana[0].member_id, bruno);
        assert_eq!(of_ana[0].alias, "Bruno");

        let of_bruno = conversation_partners_of(&pool, bruno).await.unwrap();
        assert_eq!(of_bruno.len(), 1);
        assert_eq!(of_bruno[0].member_id, ana);
    }

    #[sqlx::test]
    async fn self_sponsorship_is_rejected(pool: PgPool) {
        let ana = seed_member(&pool, "Ana").await;

        let result = reassign_sponsor(&pool, ana, Some(ana)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sponsor_links")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
