use sqlx::SqlitePool;

const SQL_CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  user_id           TEXT PRIMARY KEY,
  email             TEXT NOT NULL UNIQUE,
  name              TEXT NOT NULL,
  role              TEXT NOT NULL DEFAULT 'CL',
  registration_type TEXT,
  is_blocked        INTEGER NOT NULL DEFAULT 0,
  created_at        TEXT NOT NULL DEFAULT (datetime('now')),
  updated_at        TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const SQL_CREATE_PROFILES: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
  id               INTEGER PRIMARY KEY AUTOINCREMENT,
  user_id          TEXT NOT NULL UNIQUE REFERENCES users (user_id),
  contact          TEXT NOT NULL,
  aadhaar_file_url TEXT NOT NULL,
  college_id_url   TEXT NOT NULL,
  college_name     TEXT NOT NULL,
  status           TEXT NOT NULL DEFAULT 'PENDING',
  rejection_reason TEXT,
  created_at       TEXT NOT NULL DEFAULT (datetime('now')),
  updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const SQL_CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
  event_id      TEXT PRIMARY KEY,
  name          TEXT NOT NULL,
  category      TEXT NOT NULL,
  description   TEXT,
  min_team_size INTEGER NOT NULL,
  max_team_size INTEGER NOT NULL,
  max_slots     INTEGER NOT NULL,
  filled_slots  INTEGER NOT NULL DEFAULT 0,
  is_active     INTEGER NOT NULL DEFAULT 1,
  is_locked     INTEGER NOT NULL DEFAULT 0,
  created_at    TEXT NOT NULL DEFAULT (datetime('now')),
  updated_at    TEXT NOT NULL DEFAULT (datetime('now'))
)
"#;

const SQL_CREATE_PARTICIPANTS: &str = r#"
CREATE TABLE IF NOT EXISTS participants (
  id               INTEGER PRIMARY KEY AUTOINCREMENT,
  event_id         TEXT NOT NULL REFERENCES events (event_id),
  cl_id            TEXT NOT NULL REFERENCES users (user_id),
  name             TEXT NOT NULL,
  college_name     TEXT NOT NULL,
  email            TEXT NOT NULL,
  contact          TEXT NOT NULL,
  aadhaar_file_url TEXT NOT NULL,
  id_file_url      TEXT NOT NULL,
  status           TEXT NOT NULL DEFAULT 'PENDING',
  rejection_reason TEXT,
  submitted_at     TEXT,
  created_at       TEXT NOT NULL DEFAULT (datetime('now')),
  updated_at       TEXT NOT NULL DEFAULT (datetime('now')),
  UNIQUE (email, event_id)
)
"#;

const SQL_CREATE_PARTICIPANT_EVENT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_participants_event_status
ON participants (event_id, status)
"#;

/// Idempotent schema bootstrap, run at startup and by the test suites.
pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(SQL_CREATE_USERS).execute(pool).await?;
    sqlx::query(SQL_CREATE_PROFILES).execute(pool).await?;
    sqlx::query(SQL_CREATE_EVENTS).execute(pool).await?;
    sqlx::query(SQL_CREATE_PARTICIPANTS).execute(pool).await?;
    sqlx::query(SQL_CREATE_PARTICIPANT_EVENT_INDEX)
        .execute(pool)
        .await?;
    Ok(())
}
