use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::info;

#[derive(Debug, Clone, FromRow)]
pub struct StaffUser {
    pub id: i64,
    pub code: String,
    pub full_name: String,
    pub email: String,
    pub role_id: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
}

/// Same placeholder-then-patch lifecycle as members, with a `UAA{id}`
/// code. A unique-email violation surfaces as `sqlx::Error::Database`
/// with code 23505.
pub async fn create(
    db: &PgPool,
    full_name: &str,
    email: &str,
    password_hash: &str,
    role_id: i64,
) -> Result<StaffUser, sqlx::Error> {
    let mut tx = db.begin().await?;

    let new_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO staff_users (code, full_name, email, password_hash, role_id, status)
        VALUES ('PENDING', $1, $2, $3, $4, 1)
        RETURNING id
        "#,
    )
    .bind(full_name)
    .bind(email)
    .bind(password_hash)
    .bind(role_id)
    .fetch_one(&mut *tx)
    .await?;

    let user = sqlx::query_as::<_, StaffUser>(
        r#"
        UPDATE staff_users SET code = $1
        WHERE id = $2
        RETURNING id, code, full_name, email, role_id
        "#,
    )
    .bind(format!("UAA{new_id}"))
    .bind(new_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(staff_id = user.id, code = %user.code, "staff user registered");
    Ok(user)
}

pub async fn list_roles(db: &PgPool) -> Result<Vec<RoleRow>, sqlx::Error> {
    sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY id")
        .fetch_all(db)
        .await
}
