use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::{event_repo, participant_repo};
use crate::error::{ApiError, Result};
use crate::models::{EventRow, ReviewStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventInput {
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub event_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
    pub filled_slots: i64,
    pub is_active: bool,
    pub is_locked: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListItemView {
    pub event_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
    pub filled_slots: i64,
    pub pending_count: i64,
    pub is_active: bool,
    pub is_locked: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailView {
    pub event_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
    pub filled_slots: i64,
    pub is_active: bool,
    pub is_locked: bool,
    pub created_at: String,
    pub updated_at: String,
    pub participants: Vec<EventParticipantView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipantView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub college_name: String,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub cl: EventParticipantClView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParticipantClView {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

fn event_view(row: EventRow) -> EventView {
    EventView {
        event_id: row.event_id,
        name: row.name,
        category: row.category,
        description: row.description,
        min_team_size: row.min_team_size,
        max_team_size: row.max_team_size,
        max_slots: row.max_slots,
        filled_slots: row.filled_slots,
        is_active: row.is_active == 1,
        is_locked: row.is_locked == 1,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub async fn list_events(
    pool: &SqlitePool,
    category: Option<&str>,
) -> Result<Vec<EventListItemView>> {
    let rows = event_repo::list(pool, category).await?;
    Ok(rows
        .into_iter()
        .map(|row| EventListItemView {
            event_id: row.event_id,
            name: row.name,
            category: row.category,
            description: row.description,
            min_team_size: row.min_team_size,
            max_team_size: row.max_team_size,
            max_slots: row.max_slots,
            filled_slots: row.filled_slots,
            pending_count: row.pending_count,
            is_active: row.is_active == 1,
            is_locked: row.is_locked == 1,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

pub async fn get_event(pool: &SqlitePool, event_id: &str) -> Result<EventDetailView> {
    let event = require_event(pool, event_id).await?;
    let participants = participant_repo::list_by_event(pool, event_id).await?;

    Ok(EventDetailView {
        event_id: event.event_id,
        name: event.name,
        category: event.category,
        description: event.description,
        min_team_size: event.min_team_size,
        max_team_size: event.max_team_size,
        max_slots: event.max_slots,
        filled_slots: event.filled_slots,
        is_active: event.is_active == 1,
        is_locked: event.is_locked == 1,
        created_at: event.created_at,
        updated_at: event.updated_at,
        participants: participants
            .into_iter()
            .map(|p| EventParticipantView {
                id: p.id,
                name: p.name,
                email: p.email,
                contact: p.contact,
                college_name: p.college_name,
                status: p.status,
                rejection_reason: p.rejection_reason,
                cl: EventParticipantClView {
                    user_id: p.cl_id,
                    name: p.cl_name,
                    email: p.cl_email,
                },
            })
            .collect(),
    })
}

pub async fn create_event(pool: &SqlitePool, input: CreateEventInput) -> Result<EventView> {
    if input.name.trim().is_empty() || input.category.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "event name and category are required".into(),
        ));
    }
    if input.min_team_size < 1 || input.max_team_size < 1 || input.max_slots < 1 {
        return Err(ApiError::InvalidRequest(
            "team sizes and slots must be at least 1".into(),
        ));
    }
    if input.min_team_size > input.max_team_size {
        return Err(ApiError::InvalidRequest(
            "minimum team size cannot be greater than max team size".into(),
        ));
    }

    let event_id = Uuid::new_v4().to_string();
    event_repo::insert(
        pool,
        event_repo::NewEvent {
            event_id: &event_id,
            name: input.name.trim(),
            category: input.category.trim(),
            description: input.description.as_deref(),
            min_team_size: input.min_team_size,
            max_team_size: input.max_team_size,
            max_slots: input.max_slots,
        },
    )
    .await?;

    Ok(event_view(require_event(pool, &event_id).await?))
}

pub async fn update_event(
    pool: &SqlitePool,
    event_id: &str,
    input: UpdateEventInput,
) -> Result<EventView> {
    require_event(pool, event_id).await?;

    if let (Some(min), Some(max)) = (input.min_team_size, input.max_team_size) {
        if min > max {
            return Err(ApiError::InvalidRequest(
                "minimum team size cannot be greater than max team size".into(),
            ));
        }
    }
    if let (Some(filled), Some(max)) = (input.filled_slots, input.max_slots) {
        if filled > max {
            return Err(ApiError::InvalidRequest(
                "filled slots cannot exceed max slots".into(),
            ));
        }
    }

    let patch = event_repo::EventPatch {
        name: input.name,
        category: input.category,
        description: input.description,
        min_team_size: input.min_team_size,
        max_team_size: input.max_team_size,
        max_slots: input.max_slots,
        filled_slots: input.filled_slots,
        is_active: input.is_active,
        is_locked: input.is_locked,
    };
    event_repo::update(pool, event_id, &patch).await?;

    Ok(event_view(require_event(pool, event_id).await?))
}

/// Explicit admin override of the slot pair.
pub async fn adjust_slots(
    pool: &SqlitePool,
    event_id: &str,
    max_slots: i64,
    filled_slots: i64,
) -> Result<EventView> {
    require_event(pool, event_id).await?;

    if filled_slots < 0 || max_slots < 0 {
        return Err(ApiError::InvalidRequest("slots cannot be negative".into()));
    }
    if filled_slots > max_slots {
        return Err(ApiError::InvalidRequest(
            "filled slots cannot exceed max slots".into(),
        ));
    }

    event_repo::set_slots(pool, event_id, max_slots, filled_slots).await?;
    Ok(event_view(require_event(pool, event_id).await?))
}

// Read-modify-write; a concurrent toggle can lose, which is acceptable for
// an admin switch.
pub async fn toggle_active(pool: &SqlitePool, event_id: &str) -> Result<EventView> {
    let event = require_event(pool, event_id).await?;
    event_repo::set_active(pool, event_id, event.is_active != 1).await?;
    Ok(event_view(require_event(pool, event_id).await?))
}

pub async fn toggle_lock(pool: &SqlitePool, event_id: &str) -> Result<EventView> {
    let event = require_event(pool, event_id).await?;
    event_repo::set_locked(pool, event_id, event.is_locked != 1).await?;
    Ok(event_view(require_event(pool, event_id).await?))
}

pub async fn delete_event(pool: &SqlitePool, event_id: &str) -> Result<()> {
    require_event(pool, event_id).await?;

    let participants = event_repo::count_participants(pool, event_id).await?;
    if participants > 0 {
        return Err(ApiError::InvalidRequest(
            "cannot delete an event with existing participants".into(),
        ));
    }

    event_repo::delete(pool, event_id).await?;
    Ok(())
}

async fn require_event(pool: &SqlitePool, event_id: &str) -> Result<EventRow> {
    event_repo::find(pool, event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{schema, user_repo};
    use crate::models::Role;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::init(&pool).await.unwrap();
        pool
    }

    fn sample_event() -> CreateEventInput {
        CreateEventInput {
            name: "Robo Rally".to_string(),
            category: "robotics".to_string(),
            description: Some("Line-follower race".to_string()),
            min_team_size: 2,
            max_team_size: 4,
            max_slots: 10,
        }
    }

    async fn seed_cl(pool: &SqlitePool) -> String {
        user_repo::insert(
            pool,
            user_repo::NewUser {
                user_id: "cl-1",
                email: "cl@fest.test",
                name: "Test CL",
                role: Role::Cl,
                registration_type: None,
            },
        )
        .await
        .unwrap();
        "cl-1".to_string()
    }

    #[tokio::test]
    async fn create_rejects_inverted_team_sizes() {
        let pool = setup_pool().await;
        let input = CreateEventInput {
            min_team_size: 5,
            max_team_size: 2,
            ..sample_event()
        };
        assert!(matches!(
            create_event(&pool, input).await,
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn create_then_list_reports_counts() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();
        assert_eq!(created.filled_slots, 0);
        assert!(created.is_active);
        assert!(!created.is_locked);

        let all = list_events(&pool, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].pending_count, 0);

        let filtered = list_events(&pool, Some("robotics")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        let none = list_events(&pool, Some("music")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn update_validates_supplied_pairs() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();

        let err = update_event(
            &pool,
            &created.event_id,
            UpdateEventInput {
                min_team_size: Some(6),
                max_team_size: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        let err = update_event(
            &pool,
            &created.event_id,
            UpdateEventInput {
                max_slots: Some(5),
                filled_slots: Some(9),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        let updated = update_event(
            &pool,
            &created.event_id,
            UpdateEventInput {
                name: Some("Robo Rally 2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Robo Rally 2");
        // Untouched fields survive a partial update.
        assert_eq!(updated.category, "robotics");
        assert_eq!(updated.max_slots, 10);

        assert!(matches!(
            update_event(&pool, "missing", UpdateEventInput::default()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn adjust_slots_enforces_bounds() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();

        assert!(matches!(
            adjust_slots(&pool, &created.event_id, 5, 6).await,
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            adjust_slots(&pool, &created.event_id, -1, 0).await,
            Err(ApiError::InvalidRequest(_))
        ));

        let adjusted = adjust_slots(&pool, &created.event_id, 20, 3).await.unwrap();
        assert_eq!(adjusted.max_slots, 20);
        assert_eq!(adjusted.filled_slots, 3);
    }

    #[tokio::test]
    async fn toggles_flip_flags() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();

        let toggled = toggle_active(&pool, &created.event_id).await.unwrap();
        assert!(!toggled.is_active);
        let toggled = toggle_active(&pool, &created.event_id).await.unwrap();
        assert!(toggled.is_active);

        let locked = toggle_lock(&pool, &created.event_id).await.unwrap();
        assert!(locked.is_locked);
    }

    #[tokio::test]
    async fn delete_refuses_events_with_participants() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();
        let cl_id = seed_cl(&pool).await;

        participant_repo::insert(
            &pool,
            participant_repo::NewParticipant {
                event_id: &created.event_id,
                cl_id: &cl_id,
                name: "P One",
                college_name: "Test College",
                email: "p1@fest.test",
                contact: "9876543210",
                aadhaar_file_url: "https://files.test/a.pdf",
                id_file_url: "https://files.test/id.pdf",
            },
        )
        .await
        .unwrap();

        let err = delete_event(&pool, &created.event_id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        // Event row is untouched.
        assert!(event_repo::find(&pool, &created.event_id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn delete_removes_empty_event() {
        let pool = setup_pool().await;
        let created = create_event(&pool, sample_event()).await.unwrap();

        delete_event(&pool, &created.event_id).await.unwrap();
        assert!(event_repo::find(&pool, &created.event_id)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(
            delete_event(&pool, &created.event_id).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
