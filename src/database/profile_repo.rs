use sqlx::SqlitePool;

use crate::models::{ProfileRow, ProfileWithUserRow, ReviewStatus};

const SQL_FIND_BY_USER: &str = r#"
SELECT id, user_id, contact, aadhaar_file_url, college_id_url, college_name,
       status, rejection_reason, created_at, updated_at
FROM profiles
WHERE user_id = ?
LIMIT 1
"#;

const SQL_FIND_BY_ID: &str = r#"
SELECT id, user_id, contact, aadhaar_file_url, college_id_url, college_name,
       status, rejection_reason, created_at, updated_at
FROM profiles
WHERE id = ?
LIMIT 1
"#;

const SQL_FIND_WITH_USER: &str = r#"
SELECT p.id, p.user_id, p.contact, p.aadhaar_file_url, p.college_id_url, p.college_name,
       p.status, p.rejection_reason, p.created_at, p.updated_at,
       u.email AS user_email,
       u.name  AS user_name,
       u.role  AS user_role
FROM profiles p
JOIN users u ON u.user_id = p.user_id
WHERE p.id = ?
LIMIT 1
"#;

const SQL_FIND_WITH_USER_BY_USER: &str = r#"
SELECT p.id, p.user_id, p.contact, p.aadhaar_file_url, p.college_id_url, p.college_name,
       p.status, p.rejection_reason, p.created_at, p.updated_at,
       u.email AS user_email,
       u.name  AS user_name,
       u.role  AS user_role
FROM profiles p
JOIN users u ON u.user_id = p.user_id
WHERE p.user_id = ?
LIMIT 1
"#;

const SQL_INSERT_PROFILE: &str = r#"
INSERT INTO profiles (user_id, contact, aadhaar_file_url, college_id_url, college_name)
VALUES (?, ?, ?, ?, ?)
"#;

// Owner resubmission: absent fields stay untouched, the review state always
// returns to PENDING and any previous rejection reason is cleared.
const SQL_RESUBMIT: &str = r#"
UPDATE profiles
SET contact          = COALESCE(?, contact),
    aadhaar_file_url = COALESCE(?, aadhaar_file_url),
    college_id_url   = COALESCE(?, college_id_url),
    college_name     = COALESCE(?, college_name),
    status           = 'PENDING',
    rejection_reason = NULL,
    updated_at       = datetime('now')
WHERE user_id = ?
"#;

const SQL_SET_STATUS: &str = r#"
UPDATE profiles
SET status           = ?,
    rejection_reason = ?,
    updated_at       = datetime('now')
WHERE id = ?
"#;

const SQL_LIST: &str = r#"
SELECT p.id, p.user_id, p.contact, p.aadhaar_file_url, p.college_id_url, p.college_name,
       p.status, p.rejection_reason, p.created_at, p.updated_at,
       u.email AS user_email,
       u.name  AS user_name,
       u.role  AS user_role
FROM profiles p
JOIN users u ON u.user_id = p.user_id
WHERE (? IS NULL OR p.status = ?)
  AND (
    ? = ''
    OR lower(p.college_name) LIKE ?
    OR lower(p.contact) LIKE ?
    OR lower(u.email) LIKE ?
  )
ORDER BY datetime(p.created_at) DESC, p.id DESC
"#;

pub struct NewProfile<'a> {
    pub user_id: &'a str,
    pub contact: &'a str,
    pub aadhaar_file_url: &'a str,
    pub college_id_url: &'a str,
    pub college_name: &'a str,
}

#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub contact: Option<String>,
    pub aadhaar_file_url: Option<String>,
    pub college_id_url: Option<String>,
    pub college_name: Option<String>,
}

pub async fn find_by_user_id(pool: &SqlitePool, user_id: &str) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(SQL_FIND_BY_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<ProfileRow>> {
    sqlx::query_as::<_, ProfileRow>(SQL_FIND_BY_ID)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<ProfileWithUserRow>> {
    sqlx::query_as::<_, ProfileWithUserRow>(SQL_FIND_WITH_USER)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_user_by_user_id(
    pool: &SqlitePool,
    user_id: &str,
) -> sqlx::Result<Option<ProfileWithUserRow>> {
    sqlx::query_as::<_, ProfileWithUserRow>(SQL_FIND_WITH_USER_BY_USER)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &SqlitePool, profile: NewProfile<'_>) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_PROFILE)
        .bind(profile.user_id)
        .bind(profile.contact)
        .bind(profile.aadhaar_file_url)
        .bind(profile.college_id_url)
        .bind(profile.college_name)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

pub async fn resubmit(pool: &SqlitePool, user_id: &str, patch: &ProfilePatch) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_RESUBMIT)
        .bind(patch.contact.as_deref())
        .bind(patch.aadhaar_file_url.as_deref())
        .bind(patch.college_id_url.as_deref())
        .bind(patch.college_name.as_deref())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_status(
    pool: &SqlitePool,
    id: i64,
    status: ReviewStatus,
    rejection_reason: Option<&str>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_STATUS)
        .bind(status)
        .bind(rejection_reason)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list(
    pool: &SqlitePool,
    status: Option<ReviewStatus>,
    q_like: &str,
) -> sqlx::Result<Vec<ProfileWithUserRow>> {
    sqlx::query_as::<_, ProfileWithUserRow>(SQL_LIST)
        .bind(status)
        .bind(status)
        .bind(q_like)
        .bind(q_like)
        .bind(q_like)
        .bind(q_like)
        .fetch_all(pool)
        .await
}
