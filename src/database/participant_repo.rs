use sqlx::SqlitePool;

use crate::models::{ParticipantDetailRow, ParticipantRow, ReviewStatus};

const SQL_FIND_DETAIL: &str = r#"
SELECT p.id, p.event_id, p.cl_id, p.name, p.college_name, p.email, p.contact,
       p.aadhaar_file_url, p.id_file_url, p.status, p.rejection_reason,
       p.submitted_at, p.created_at, p.updated_at,
       u.name     AS cl_name,
       u.email    AS cl_email,
       e.name     AS event_name,
       e.category AS event_category
FROM participants p
JOIN users u ON u.user_id = p.cl_id
JOIN events e ON e.event_id = p.event_id
WHERE p.id = ?
LIMIT 1
"#;

const SQL_LIST_MINE: &str = r#"
SELECT p.id, p.event_id, p.cl_id, p.name, p.college_name, p.email, p.contact,
       p.aadhaar_file_url, p.id_file_url, p.status, p.rejection_reason,
       p.submitted_at, p.created_at, p.updated_at,
       u.name     AS cl_name,
       u.email    AS cl_email,
       e.name     AS event_name,
       e.category AS event_category
FROM participants p
JOIN users u ON u.user_id = p.cl_id
JOIN events e ON e.event_id = p.event_id
WHERE p.cl_id = ?
ORDER BY datetime(p.created_at) DESC, p.id DESC
"#;

const SQL_LIST_BY_EVENT: &str = r#"
SELECT p.id, p.event_id, p.cl_id, p.name, p.college_name, p.email, p.contact,
       p.aadhaar_file_url, p.id_file_url, p.status, p.rejection_reason,
       p.submitted_at, p.created_at, p.updated_at,
       u.name     AS cl_name,
       u.email    AS cl_email,
       e.name     AS event_name,
       e.category AS event_category
FROM participants p
JOIN users u ON u.user_id = p.cl_id
JOIN events e ON e.event_id = p.event_id
WHERE p.event_id = ?
ORDER BY datetime(p.created_at) DESC, p.id DESC
"#;

const SQL_LIST_ALL: &str = r#"
SELECT p.id, p.event_id, p.cl_id, p.name, p.college_name, p.email, p.contact,
       p.aadhaar_file_url, p.id_file_url, p.status, p.rejection_reason,
       p.submitted_at, p.created_at, p.updated_at,
       u.name     AS cl_name,
       u.email    AS cl_email,
       e.name     AS event_name,
       e.category AS event_category
FROM participants p
JOIN users u ON u.user_id = p.cl_id
JOIN events e ON e.event_id = p.event_id
WHERE (? IS NULL OR p.status = ?)
  AND (? IS NULL OR p.event_id = ?)
  AND (
    ? = ''
    OR lower(p.name) LIKE ?
    OR lower(p.email) LIKE ?
    OR lower(p.contact) LIKE ?
  )
ORDER BY datetime(p.created_at) DESC, p.id DESC
"#;

const SQL_FIND: &str = r#"
SELECT id, event_id, cl_id, name, college_name, email, contact,
       aadhaar_file_url, id_file_url, status, rejection_reason,
       submitted_at, created_at, updated_at
FROM participants
WHERE id = ?
LIMIT 1
"#;

const SQL_EXISTS_FOR_EVENT: &str = r#"
SELECT COUNT(*)
FROM participants
WHERE email = ? AND event_id = ?
"#;

const SQL_INSERT_PARTICIPANT: &str = r#"
INSERT INTO participants (event_id, cl_id, name, college_name, email, contact, aadhaar_file_url, id_file_url)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const SQL_SET_STATUS: &str = r#"
UPDATE participants
SET status           = ?,
    rejection_reason = ?,
    updated_at       = datetime('now')
WHERE id = ?
"#;

// Partial owner edit; a non-NULL status bind resets the review state.
const SQL_UPDATE_FIELDS: &str = r#"
UPDATE participants
SET name             = COALESCE(?, name),
    college_name     = COALESCE(?, college_name),
    email            = COALESCE(?, email),
    contact          = COALESCE(?, contact),
    aadhaar_file_url = COALESCE(?, aadhaar_file_url),
    id_file_url      = COALESCE(?, id_file_url),
    status           = COALESCE(?, status),
    updated_at       = datetime('now')
WHERE id = ?
"#;

const SQL_DELETE_PARTICIPANT: &str = r#"
DELETE FROM participants
WHERE id = ?
"#;

// The increment is conditional on remaining capacity; SQLite re-evaluates it
// under the write lock, so two racing approvals cannot both claim the last
// slot.
const SQL_CLAIM_SLOT: &str = r#"
UPDATE events
SET filled_slots = filled_slots + 1,
    updated_at   = datetime('now')
WHERE event_id = ?
  AND filled_slots < max_slots
"#;

const SQL_RELEASE_SLOT: &str = r#"
UPDATE events
SET filled_slots = filled_slots - 1,
    updated_at   = datetime('now')
WHERE event_id = ?
  AND filled_slots > 0
"#;

const SQL_MARK_APPROVED: &str = r#"
UPDATE participants
SET status       = 'APPROVED',
    submitted_at = datetime('now'),
    updated_at   = datetime('now')
WHERE id = ?
"#;

pub struct NewParticipant<'a> {
    pub event_id: &'a str,
    pub cl_id: &'a str,
    pub name: &'a str,
    pub college_name: &'a str,
    pub email: &'a str,
    pub contact: &'a str,
    pub aadhaar_file_url: &'a str,
    pub id_file_url: &'a str,
}

#[derive(Debug, Default)]
pub struct ParticipantPatch {
    pub name: Option<String>,
    pub college_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub aadhaar_file_url: Option<String>,
    pub id_file_url: Option<String>,
}

/// Outcome of the conditional slot increment inside an approval transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotClaim {
    Claimed,
    Full,
}

pub async fn find(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<ParticipantRow>> {
    sqlx::query_as::<_, ParticipantRow>(SQL_FIND)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_detail(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<ParticipantDetailRow>> {
    sqlx::query_as::<_, ParticipantDetailRow>(SQL_FIND_DETAIL)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exists_for_event(pool: &SqlitePool, email: &str, event_id: &str) -> sqlx::Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(SQL_EXISTS_FOR_EVENT)
        .bind(email)
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

pub async fn insert(pool: &SqlitePool, participant: NewParticipant<'_>) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_PARTICIPANT)
        .bind(participant.event_id)
        .bind(participant.cl_id)
        .bind(participant.name)
        .bind(participant.college_name)
        .bind(participant.email)
        .bind(participant.contact)
        .bind(participant.aadhaar_file_url)
        .bind(participant.id_file_url)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

pub async fn list_mine(pool: &SqlitePool, cl_id: &str) -> sqlx::Result<Vec<ParticipantDetailRow>> {
    sqlx::query_as::<_, ParticipantDetailRow>(SQL_LIST_MINE)
        .bind(cl_id)
        .fetch_all(pool)
        .await
}

pub async fn list_by_event(
    pool: &SqlitePool,
    event_id: &str,
) -> sqlx::Result<Vec<ParticipantDetailRow>> {
    sqlx::query_as::<_, ParticipantDetailRow>(SQL_LIST_BY_EVENT)
        .bind(event_id)
        .fetch_all(pool)
        .await
}

pub async fn list_all(
    pool: &SqlitePool,
    status: Option<ReviewStatus>,
    event_id: Option<&str>,
    q_like: &str,
) -> sqlx::Result<Vec<ParticipantDetailRow>> {
    sqlx::query_as::<_, ParticipantDetailRow>(SQL_LIST_ALL)
        .bind(status)
        .bind(status)
        .bind(event_id)
        .bind(event_id)
        .bind(q_like)
        .bind(q_like)
        .bind(q_like)
        .bind(q_like)
        .fetch_all(pool)
        .await
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

pub async fn update_fields(
    pool: &SqlitePool,
    id: i64,
    patch: &ParticipantPatch,
    new_status: Option<ReviewStatus>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_FIELDS)
        .bind(patch.name.as_deref())
        .bind(patch.college_name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.contact.as_deref())
        .bind(patch.aadhaar_file_url.as_deref())
        .bind(patch.id_file_url.as_deref())
        .bind(new_status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_PARTICIPANT)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Approve a participant and claim one slot on its event as a single
/// transaction. Returns `SlotClaim::Full` (and commits nothing) when the
/// event has no remaining capacity at commit time.
pub async fn approve_with_slot(
    pool: &SqlitePool,
    id: i64,
    event_id: &str,
) -> sqlx::Result<SlotClaim> {
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(SQL_CLAIM_SLOT)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(SlotClaim::Full);
    }

    sqlx::query(SQL_MARK_APPROVED)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(SlotClaim::Claimed)
}

/// Reject a previously-approved participant, releasing its slot in the same
/// transaction.
pub async fn reject_with_slot(
    pool: &SqlitePool,
    id: i64,
    event_id: &str,
    rejection_reason: Option<&str>,
) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(SQL_RELEASE_SLOT)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(SQL_SET_STATUS)
        .bind(ReviewStatus::Rejected)
        .bind(rejection_reason)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Owner edit of an approved registration: release the slot and reset the
/// row to PENDING atomically, so the registration must be re-reviewed.
pub async fn update_with_slot_release(
    pool: &SqlitePool,
    id: i64,
    event_id: &str,
    patch: &ParticipantPatch,
) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(SQL_RELEASE_SLOT)
        .bind(event_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(SQL_UPDATE_FIELDS)
        .bind(patch.name.as_deref())
        .bind(patch.college_name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.contact.as_deref())
        .bind(patch.aadhaar_file_url.as_deref())
        .bind(patch.id_file_url.as_deref())
        .bind(ReviewStatus::Pending)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
