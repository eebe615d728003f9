use sqlx::SqlitePool;

use crate::models::{RegistrationType, Role, UserRow};

const SQL_FIND_BY_EMAIL: &str = r#"
SELECT user_id, email, name, role, registration_type, is_blocked, created_at, updated_at
FROM users
WHERE email = ?
LIMIT 1
"#;

const SQL_FIND_BY_ID: &str = r#"
SELECT user_id, email, name, role, registration_type, is_blocked, created_at, updated_at
FROM users
WHERE user_id = ?
LIMIT 1
"#;

const SQL_INSERT_USER: &str = r#"
INSERT INTO users (user_id, email, name, role, registration_type)
VALUES (?, ?, ?, ?, ?)
"#;

const SQL_SET_REGISTRATION_TYPE: &str = r#"
UPDATE users
SET registration_type = ?,
    updated_at = datetime('now')
WHERE user_id = ?
"#;

const SQL_SET_BLOCKED: &str = r#"
UPDATE users
SET is_blocked = ?,
    updated_at = datetime('now')
WHERE user_id = ?
"#;

pub struct NewUser<'a> {
    pub user_id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub role: Role,
    pub registration_type: Option<RegistrationType>,
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(SQL_FIND_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<UserRow>> {
    sqlx::query_as::<_, UserRow>(SQL_FIND_BY_ID)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &SqlitePool, user: NewUser<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_USER)
        .bind(user.user_id)
        .bind(user.email)
        .bind(user.name)
        .bind(user.role)
        .bind(user.registration_type)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_registration_type(
    pool: &SqlitePool,
    user_id: &str,
    registration_type: RegistrationType,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_REGISTRATION_TYPE)
        .bind(registration_type)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_blocked(pool: &SqlitePool, user_id: &str, blocked: bool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_BLOCKED)
        .bind(blocked)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
