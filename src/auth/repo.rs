use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, FromRow)]
pub struct StaffAccount {
    pub id: i64,
    pub full_name: String,
    pub password_hash: String,
    pub role_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MemberAccount {
    pub id: i64,
    pub alias: String,
    pub password_hash: String,
}

pub async fn find_active_staff_by_email(
    db: &PgPool,
    email: &str,
) -> anyhow::Result<Option<StaffAccount>> {
    let account = sqlx::query_as::<_, StaffAccount>(
        r#"
        SELECT u.id, u.full_name, u.password_hash, r.name AS role_name
        FROM staff_users u
        JOIN roles r ON u.role_id = r.id
        WHERE u.email = $1 AND u.status = 1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(account)
}

pub async fn find_active_member_by_code(
    db: &PgPool,
    code: &str,
) -> anyhow::Result<Option<MemberAccount>> {
    let account = sqlx::query_as::<_, MemberAccount>(
        r#"
        SELECT id, alias, password_hash
        FROM members
        WHERE code = $1 AND status = 1
        "#,
    )
    .bind(code)
    .fetch_optional(db)
    .await?;
    Ok(account)
}
