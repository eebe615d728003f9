use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::database::{event_repo, participant_repo};
use crate::error::{ApiError, Result};
use crate::models::{ParticipantDetailRow, ParticipantRow, ReviewStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateParticipantInput {
    pub name: String,
    pub college_name: String,
    pub email: String,
    pub contact: String,
    pub aadhaar_file_url: String,
    pub id_file_url: String,
    pub event_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParticipantInput {
    pub name: Option<String>,
    pub college_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub aadhaar_file_url: Option<String>,
    pub id_file_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct ParticipantFilter {
    pub status: Option<ReviewStatus>,
    pub event_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: i64,
    pub event_id: String,
    pub cl_id: String,
    pub name: String,
    pub college_name: String,
    pub email: String,
    pub contact: String,
    pub aadhaar_file_url: String,
    pub id_file_url: String,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub submitted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub cl: ClRefView,
    pub event: EventRefView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClRefView {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRefView {
    pub event_id: String,
    pub name: String,
    pub category: String,
}

fn participant_view(row: ParticipantDetailRow) -> ParticipantView {
    ParticipantView {
        id: row.id,
        event_id: row.event_id.clone(),
        cl_id: row.cl_id.clone(),
        name: row.name,
        college_name: row.college_name,
        email: row.email,
        contact: row.contact,
        aadhaar_file_url: row.aadhaar_file_url,
        id_file_url: row.id_file_url,
        status: row.status,
        rejection_reason: row.rejection_reason,
        submitted_at: row.submitted_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
        cl: ClRefView {
            user_id: row.cl_id,
            name: row.cl_name,
            email: row.cl_email,
        },
        event: EventRefView {
            event_id: row.event_id,
            name: row.event_name,
            category: row.event_category,
        },
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::InvalidRequest("a valid email is required".into()));
    }
    Ok(())
}

fn validate_required(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidRequest(format!("{field} is required")));
    }
    Ok(())
}

pub async fn create_participant(
    pool: &SqlitePool,
    cl_id: &str,
    input: CreateParticipantInput,
) -> Result<ParticipantView> {
    validate_required(&input.name, "name")?;
    validate_required(&input.college_name, "college name")?;
    validate_required(&input.contact, "contact")?;
    validate_required(&input.aadhaar_file_url, "aadhaar file url")?;
    validate_required(&input.id_file_url, "id file url")?;
    validate_email(&input.email)?;

    let event = event_repo::find(pool, &input.event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))?;

    if event.is_active != 1 || event.is_locked == 1 {
        return Err(ApiError::InvalidRequest(
            "event is not accepting registrations".into(),
        ));
    }

    let email = input.email.trim().to_lowercase();
    if participant_repo::exists_for_event(pool, &email, &input.event_id).await? {
        return Err(ApiError::InvalidRequest(
            "this email is already registered for this event".into(),
        ));
    }

    let id = participant_repo::insert(
        pool,
        participant_repo::NewParticipant {
            event_id: &input.event_id,
            cl_id,
            name: input.name.trim(),
            college_name: input.college_name.trim(),
            email: &email,
            contact: input.contact.trim(),
            aadhaar_file_url: input.aadhaar_file_url.trim(),
            id_file_url: input.id_file_url.trim(),
        },
    )
    .await?;

    detail_view(pool, id).await
}

pub async fn my_participants(pool: &SqlitePool, cl_id: &str) -> Result<Vec<ParticipantView>> {
    let rows = participant_repo::list_mine(pool, cl_id).await?;
    Ok(rows.into_iter().map(participant_view).collect())
}

pub async fn participants_by_event(
    pool: &SqlitePool,
    event_id: &str,
) -> Result<Vec<ParticipantView>> {
    let rows = participant_repo::list_by_event(pool, event_id).await?;
    Ok(rows.into_iter().map(participant_view).collect())
}

pub async fn list_participants(
    pool: &SqlitePool,
    filter: &ParticipantFilter,
) -> Result<Vec<ParticipantView>> {
    let q_like = match filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(q) => format!("%{}%", q.to_lowercase()),
        None => String::new(),
    };
    let rows = participant_repo::list_all(
        pool,
        filter.status,
        filter.event_id.as_deref(),
        &q_like,
    )
    .await?;
    Ok(rows.into_iter().map(participant_view).collect())
}

/// Admin approval. The stored counter is checked first, then the approval
/// and the slot increment commit together; a raced-away last slot surfaces
/// as the same capacity error.
pub async fn approve_participant(pool: &SqlitePool, id: i64) -> Result<()> {
    let participant = require_participant(pool, id).await?;

    if participant.status == ReviewStatus::Approved {
        return Err(ApiError::InvalidRequest(
            "participant already approved".into(),
        ));
    }

    let event = event_repo::find(pool, &participant.event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))?;

    if event.filled_slots >= event.max_slots {
        return Err(ApiError::InvalidRequest("event is full".into()));
    }

    match participant_repo::approve_with_slot(pool, id, &participant.event_id).await? {
        participant_repo::SlotClaim::Claimed => Ok(()),
        participant_repo::SlotClaim::Full => {
            Err(ApiError::InvalidRequest("event is full".into()))
        }
    }
}

pub async fn reject_participant(
    pool: &SqlitePool,
    id: i64,
    rejection_reason: Option<&str>,
) -> Result<()> {
    if let Some(reason) = rejection_reason {
        if reason.chars().count() > 500 {
            return Err(ApiError::InvalidRequest(
                "rejection reason must be at most 500 characters".into(),
            ));
        }
    }

    let participant = require_participant(pool, id).await?;

    if participant.status == ReviewStatus::Approved {
        // The slot goes back in the same transaction as the status change.
        participant_repo::reject_with_slot(pool, id, &participant.event_id, rejection_reason)
            .await?;
    } else {
        participant_repo::set_status(pool, id, ReviewStatus::Rejected, rejection_reason).await?;
    }

    Ok(())
}

/// Owner edit. Editing a reviewed registration sends it back to PENDING;
/// editing an approved one additionally releases its slot.
pub async fn update_participant(
    pool: &SqlitePool,
    id: i64,
    cl_id: &str,
    input: UpdateParticipantInput,
) -> Result<ParticipantView> {
    let participant = require_participant(pool, id).await?;

    if participant.cl_id != cl_id {
        return Err(ApiError::Forbidden(
            "you can only update your own participants".into(),
        ));
    }

    if let Some(email) = input.email.as_deref() {
        validate_email(email)?;
    }

    let patch = participant_repo::ParticipantPatch {
        name: input.name,
        college_name: input.college_name,
        email: input.email.map(|e| e.trim().to_lowercase()),
        contact: input.contact,
        aadhaar_file_url: input.aadhaar_file_url,
        id_file_url: input.id_file_url,
    };

    match participant.status {
        ReviewStatus::Approved => {
            participant_repo::update_with_slot_release(pool, id, &participant.event_id, &patch)
                .await?;
        }
        ReviewStatus::Rejected => {
            participant_repo::update_fields(pool, id, &patch, Some(ReviewStatus::Pending)).await?;
        }
        ReviewStatus::Pending => {
            participant_repo::update_fields(pool, id, &patch, None).await?;
        }
    }

    detail_view(pool, id).await
}

pub async fn delete_participant(pool: &SqlitePool, id: i64, cl_id: &str) -> Result<()> {
    let participant = require_participant(pool, id).await?;

    if participant.cl_id != cl_id {
        return Err(ApiError::Forbidden(
            "you can only delete your own participants".into(),
        ));
    }

    if participant.status != ReviewStatus::Pending {
        return Err(ApiError::InvalidRequest(
            "cannot delete a reviewed registration".into(),
        ));
    }

    participant_repo::delete(pool, id).await?;
    Ok(())
}

async fn require_participant(pool: &SqlitePool, id: i64) -> Result<ParticipantRow> {
    participant_repo::find(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("participant not found".into()))
}

async fn detail_view(pool: &SqlitePool, id: i64) -> Result<ParticipantView> {
    let row = participant_repo::find_detail(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("participant not found".into()))?;
    Ok(participant_view(row))
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

    async fn seed_cl(pool: &SqlitePool, user_id: &str, email: &str) {
        user_repo::insert(
            pool,
            user_repo::NewUser {
                user_id,
                email,
                name: "Test CL",
                role: Role::Cl,
                registration_type: None,
            },
        )
        .await
        .unwrap();
    }

    async fn seed_event(pool: &SqlitePool, event_id: &str, max_slots: i64) {
        event_repo::insert(
            pool,
            event_repo::NewEvent {
                event_id,
                name: "Robo Rally",
                category: "robotics",
                description: None,
                min_team_size: 1,
                max_team_size: 4,
                max_slots,
            },
        )
        .await
        .unwrap();
    }

    fn registrant(event_id: &str, email: &str) -> CreateParticipantInput {
        CreateParticipantInput {
            name: "P One".to_string(),
            college_name: "Test College".to_string(),
            email: email.to_string(),
            contact: "9876543210".to_string(),
            aadhaar_file_url: "https://files.test/a.pdf".to_string(),
            id_file_url: "https://files.test/id.pdf".to_string(),
            event_id: event_id.to_string(),
        }
    }

    async fn filled_slots(pool: &SqlitePool, event_id: &str) -> i64 {
        event_repo::find(pool, event_id)
            .await
            .unwrap()
            .unwrap()
            .filled_slots
    }

    async fn approved_count(pool: &SqlitePool, event_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM participants WHERE event_id = ? AND status = 'APPROVED'",
        )
        .bind(event_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_requires_live_event() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;

        assert!(matches!(
            create_participant(&pool, "cl-1", registrant("missing", "p1@fest.test")).await,
            Err(ApiError::NotFound(_))
        ));

        seed_event(&pool, "ev-1", 10).await;
        event_repo::set_active(&pool, "ev-1", false).await.unwrap();
        assert!(matches!(
            create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test")).await,
            Err(ApiError::InvalidRequest(_))
        ));

        event_repo::set_active(&pool, "ev-1", true).await.unwrap();
        event_repo::set_locked(&pool, "ev-1", true).await.unwrap();
        assert!(matches!(
            create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test")).await,
            Err(ApiError::InvalidRequest(_))
        ));

        event_repo::set_locked(&pool, "ev-1", false).await.unwrap();
        let created = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        assert_eq!(created.status, ReviewStatus::Pending);
        assert_eq!(created.event.name, "Robo Rally");
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 10).await;
        seed_event(&pool, "ev-2", 10).await;

        let first = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();

        let err = create_participant(&pool, "cl-1", registrant("ev-1", "P1@fest.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));

        // The original row is untouched.
        let row = participant_repo::find(&pool, first.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReviewStatus::Pending);
        assert_eq!(row.name, "P One");

        // The same email may register for a different event.
        create_participant(&pool, "cl-1", registrant("ev-2", "p1@fest.test"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn approval_claims_exactly_one_slot() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 1).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        let p2 = create_participant(&pool, "cl-1", registrant("ev-1", "p2@fest.test"))
            .await
            .unwrap();

        approve_participant(&pool, p1.id).await.unwrap();
        assert_eq!(filled_slots(&pool, "ev-1").await, 1);
        let row = participant_repo::find(&pool, p1.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReviewStatus::Approved);
        assert!(row.submitted_at.is_some());

        // Second approval on a full event fails and changes nothing.
        let err = approve_participant(&pool, p2.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(filled_slots(&pool, "ev-1").await, 1);
        let row = participant_repo::find(&pool, p2.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReviewStatus::Pending);

        // Re-approving the same participant is an error too.
        let err = approve_participant(&pool, p1.id).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
        assert_eq!(filled_slots(&pool, "ev-1").await, 1);

        assert!(matches!(
            approve_participant(&pool, 9999).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn rejecting_an_approved_participant_releases_its_slot() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        approve_participant(&pool, p1.id).await.unwrap();
        assert_eq!(filled_slots(&pool, "ev-1").await, 1);

        reject_participant(&pool, p1.id, Some("document mismatch"))
            .await
            .unwrap();
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
        let row = participant_repo::find(&pool, p1.id).await.unwrap().unwrap();
        assert_eq!(row.status, ReviewStatus::Rejected);
        assert_eq!(row.rejection_reason.as_deref(), Some("document mismatch"));

        // Rejecting again only overwrites the reason.
        reject_participant(&pool, p1.id, Some("late submission"))
            .await
            .unwrap();
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
        let row = participant_repo::find(&pool, p1.id).await.unwrap().unwrap();
        assert_eq!(row.rejection_reason.as_deref(), Some("late submission"));
    }

    #[tokio::test]
    async fn rejecting_a_pending_participant_keeps_slots() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        reject_participant(&pool, p1.id, None).await.unwrap();
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
    }

    #[tokio::test]
    async fn owner_edit_of_approved_registration_revokes_its_slot() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_cl(&pool, "cl-2", "other@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        approve_participant(&pool, p1.id).await.unwrap();

        // Someone else's CL cannot touch it.
        let err = update_participant(&pool, p1.id, "cl-2", UpdateParticipantInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(filled_slots(&pool, "ev-1").await, 1);

        let updated = update_participant(
            &pool,
            p1.id,
            "cl-1",
            UpdateParticipantInput {
                name: Some("P One Fixed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ReviewStatus::Pending);
        assert_eq!(updated.name, "P One Fixed");
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
    }

    #[tokio::test]
    async fn owner_edit_of_pending_registration_keeps_slots() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();

        let updated = update_participant(
            &pool,
            p1.id,
            "cl-1",
            UpdateParticipantInput {
                contact: Some("9123456780".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ReviewStatus::Pending);
        assert_eq!(updated.contact, "9123456780");
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
    }

    #[tokio::test]
    async fn owner_edit_of_rejected_registration_reenters_review() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();
        reject_participant(&pool, p1.id, Some("blurry id scan"))
            .await
            .unwrap();

        let updated = update_participant(
            &pool,
            p1.id,
            "cl-1",
            UpdateParticipantInput {
                id_file_url: Some("https://files.test/id-v2.pdf".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ReviewStatus::Pending);
        assert_eq!(filled_slots(&pool, "ev-1").await, 0);
    }

    #[tokio::test]
    async fn delete_is_owner_only_and_pending_only() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_cl(&pool, "cl-2", "other@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "p1@fest.test"))
            .await
            .unwrap();

        assert!(matches!(
            delete_participant(&pool, p1.id, "cl-2").await,
            Err(ApiError::Forbidden(_))
        ));

        approve_participant(&pool, p1.id).await.unwrap();
        assert!(matches!(
            delete_participant(&pool, p1.id, "cl-1").await,
            Err(ApiError::InvalidRequest(_))
        ));

        reject_participant(&pool, p1.id, None).await.unwrap();
        assert!(matches!(
            delete_participant(&pool, p1.id, "cl-1").await,
            Err(ApiError::InvalidRequest(_))
        ));

        let p2 = create_participant(&pool, "cl-1", registrant("ev-1", "p2@fest.test"))
            .await
            .unwrap();
        delete_participant(&pool, p2.id, "cl-1").await.unwrap();
        assert!(participant_repo::find(&pool, p2.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counter_matches_approved_count_after_mixed_sequence() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 3).await;

        let mut ids = Vec::new();
        for n in 1..=4 {
            let p = create_participant(
                &pool,
                "cl-1",
                registrant("ev-1", &format!("p{n}@fest.test")),
            )
            .await
            .unwrap();
            ids.push(p.id);
        }

        approve_participant(&pool, ids[0]).await.unwrap();
        approve_participant(&pool, ids[1]).await.unwrap();
        approve_participant(&pool, ids[2]).await.unwrap();
        // Capacity reached.
        assert!(approve_participant(&pool, ids[3]).await.is_err());

        reject_participant(&pool, ids[1], Some("withdrew")).await.unwrap();
        approve_participant(&pool, ids[3]).await.unwrap();

        update_participant(&pool, ids[0], "cl-1", UpdateParticipantInput::default())
            .await
            .unwrap();

        assert_eq!(filled_slots(&pool, "ev-1").await, 2);
        assert_eq!(
            filled_slots(&pool, "ev-1").await,
            approved_count(&pool, "ev-1").await
        );
    }

    #[tokio::test]
    async fn admin_listing_applies_filters() {
        let pool = setup_pool().await;
        seed_cl(&pool, "cl-1", "cl@fest.test").await;
        seed_event(&pool, "ev-1", 5).await;
        seed_event(&pool, "ev-2", 5).await;

        let p1 = create_participant(&pool, "cl-1", registrant("ev-1", "alice@fest.test"))
            .await
            .unwrap();
        create_participant(
            &pool,
            "cl-1",
            CreateParticipantInput {
                name: "Bob Builder".to_string(),
                ..registrant("ev-2", "bob@fest.test")
            },
        )
        .await
        .unwrap();
        approve_participant(&pool, p1.id).await.unwrap();

        let approved = list_participants(
            &pool,
            &ParticipantFilter {
                status: Some(ReviewStatus::Approved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].email, "alice@fest.test");

        let ev2 = list_participants(
            &pool,
            &ParticipantFilter {
                event_id: Some("ev-2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ev2.len(), 1);

        // Case-insensitive substring across name, email and contact.
        let by_name = list_participants(
            &pool,
            &ParticipantFilter {
                search: Some("BUILDER".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Bob Builder");

        let by_email = list_participants(
            &pool,
            &ParticipantFilter {
                search: Some("alice".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(by_email.len(), 1);

        let mine = my_participants(&pool, "cl-1").await.unwrap();
        assert_eq!(mine.len(), 2);
        let for_event = participants_by_event(&pool, "ev-1").await.unwrap();
        assert_eq!(for_event.len(), 1);
    }
}
