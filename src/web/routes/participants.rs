use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{ReviewStatus, Role};
use crate::services::participant_service::{
    self, CreateParticipantInput, ParticipantFilter, ParticipantView, UpdateParticipantInput,
};
use crate::state::AppState;
use crate::web::middleware::auth::{require_role, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantListQuery {
    pub status: Option<ReviewStatus>,
    pub event_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectParticipantRequest {
    pub rejection_reason: Option<String>,
}

pub async fn create_participant_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<CreateParticipantInput>,
) -> Result<Json<ParticipantView>> {
    require_role(&auth_user, &[Role::Cl])?;
    let participant =
        participant_service::create_participant(&state.pool, &auth_user.user_id, body).await?;
    Ok(Json(participant))
}

pub async fn my_participants_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<ParticipantView>>> {
    require_role(&auth_user, &[Role::Cl])?;
    let participants =
        participant_service::my_participants(&state.pool, &auth_user.user_id).await?;
    Ok(Json(participants))
}

pub async fn list_participants_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Json<Vec<ParticipantView>>> {
    require_role(&auth_user, &[Role::Admin])?;
    let filter = ParticipantFilter {
        status: query.status,
        event_id: query.event_id,
        search: query.search,
    };
    let participants = participant_service::list_participants(&state.pool, &filter).await?;
    Ok(Json(participants))
}

pub async fn participants_by_event_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<ParticipantView>>> {
    require_role(&auth_user, &[Role::Admin])?;
    let participants =
        participant_service::participants_by_event(&state.pool, &event_id).await?;
    Ok(Json(participants))
}

pub async fn approve_participant_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    participant_service::approve_participant(&state.pool, id).await?;
    Ok(Json(json!({ "message": "Participant approved successfully" })))
}

pub async fn reject_participant_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    body: Option<Json<RejectParticipantRequest>>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    participant_service::reject_participant(&state.pool, id, body.rejection_reason.as_deref())
        .await?;
    Ok(Json(json!({
        "message": "Participant rejected",
        "reason": body.rejection_reason,
    })))
}

pub async fn update_participant_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateParticipantInput>,
) -> Result<Json<ParticipantView>> {
    require_role(&auth_user, &[Role::Cl])?;
    let participant =
        participant_service::update_participant(&state.pool, id, &auth_user.user_id, body).await?;
    Ok(Json(participant))
}

pub async fn delete_participant_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Cl])?;
    participant_service::delete_participant(&state.pool, id, &auth_user.user_id).await?;
    Ok(Json(json!({ "message": "Participant deleted successfully" })))
}
