use sqlx::SqlitePool;

use crate::models::{EventRow, EventWithCountsRow};

const SQL_LIST: &str = r#"
SELECT
  e.event_id, e.name, e.category, e.description,
  e.min_team_size, e.max_team_size, e.max_slots, e.filled_slots,
  e.is_active, e.is_locked, e.created_at, e.updated_at,
  (
    SELECT COUNT(*)
    FROM participants p
    WHERE p.event_id = e.event_id
      AND p.status = 'PENDING'
  ) AS pending_count
FROM events e
WHERE (? IS NULL OR e.category = ?)
ORDER BY datetime(e.created_at) DESC, e.event_id DESC
"#;

const SQL_FIND: &str = r#"
SELECT event_id, name, category, description,
       min_team_size, max_team_size, max_slots, filled_slots,
       is_active, is_locked, created_at, updated_at
FROM events
WHERE event_id = ?
LIMIT 1
"#;

const SQL_INSERT_EVENT: &str = r#"
INSERT INTO events (event_id, name, category, description, min_team_size, max_team_size, max_slots)
VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

// Partial update: absent fields keep their current value.
const SQL_UPDATE_EVENT: &str = r#"
UPDATE events
SET name          = COALESCE(?, name),
    category      = COALESCE(?, category),
    description   = COALESCE(?, description),
    min_team_size = COALESCE(?, min_team_size),
    max_team_size = COALESCE(?, max_team_size),
    max_slots     = COALESCE(?, max_slots),
    filled_slots  = COALESCE(?, filled_slots),
    is_active     = COALESCE(?, is_active),
    is_locked     = COALESCE(?, is_locked),
    updated_at    = datetime('now')
WHERE event_id = ?
"#;

const SQL_SET_SLOTS: &str = r#"
UPDATE events
SET max_slots    = ?,
    filled_slots = ?,
    updated_at   = datetime('now')
WHERE event_id = ?
"#;

const SQL_SET_ACTIVE: &str = r#"
UPDATE events
SET is_active  = ?,
    updated_at = datetime('now')
WHERE event_id = ?
"#;

const SQL_SET_LOCKED: &str = r#"
UPDATE events
SET is_locked  = ?,
    updated_at = datetime('now')
WHERE event_id = ?
"#;

const SQL_DELETE_EVENT: &str = r#"
DELETE FROM events
WHERE event_id = ?
"#;

const SQL_COUNT_PARTICIPANTS: &str = r#"
SELECT COUNT(*)
FROM participants
WHERE event_id = ?
"#;

pub struct NewEvent<'a> {
    pub event_id: &'a str,
    pub name: &'a str,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
}

#[derive(Debug, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub min_team_size: Option<i64>,
    pub max_team_size: Option<i64>,
    pub max_slots: Option<i64>,
    pub filled_slots: Option<i64>,
    pub is_active: Option<bool>,
    pub is_locked: Option<bool>,
}

pub async fn list(
    pool: &SqlitePool,
    category: Option<&str>,
) -> sqlx::Result<Vec<EventWithCountsRow>> {
    sqlx::query_as::<_, EventWithCountsRow>(SQL_LIST)
        .bind(category)
        .bind(category)
        .fetch_all(pool)
        .await
}

pub async fn find(pool: &SqlitePool, event_id: &str) -> sqlx::Result<Option<EventRow>> {
    sqlx::query_as::<_, EventRow>(SQL_FIND)
        .bind(event_id)
        .fetch_optional(pool)
        .await
}

pub async fn insert(pool: &SqlitePool, event: NewEvent<'_>) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_INSERT_EVENT)
        .bind(event.event_id)
        .bind(event.name)
        .bind(event.category)
        .bind(event.description)
        .bind(event.min_team_size)
        .bind(event.max_team_size)
        .bind(event.max_slots)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn update(pool: &SqlitePool, event_id: &str, patch: &EventPatch) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_EVENT)
        .bind(patch.name.as_deref())
        .bind(patch.category.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.min_team_size)
        .bind(patch.max_team_size)
        .bind(patch.max_slots)
        .bind(patch.filled_slots)
        .bind(patch.is_active)
        .bind(patch.is_locked)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_slots(
    pool: &SqlitePool,
    event_id: &str,
    max_slots: i64,
    filled_slots: i64,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_SLOTS)
        .bind(max_slots)
        .bind(filled_slots)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_active(pool: &SqlitePool, event_id: &str, active: bool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_ACTIVE)
        .bind(active)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_locked(pool: &SqlitePool, event_id: &str, locked: bool) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_SET_LOCKED)
        .bind(locked)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(pool: &SqlitePool, event_id: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_EVENT)
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_participants(pool: &SqlitePool, event_id: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(SQL_COUNT_PARTICIPANTS)
        .bind(event_id)
        .fetch_one(pool)
        .await
}
