use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::Role;
use crate::services::event_service::{
    self, CreateEventInput, EventDetailView, EventListItemView, EventView, UpdateEventInput,
};
use crate::state::AppState;
use crate::web::middleware::auth::{require_role, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustSlotsRequest {
    pub max_slots: i64,
    pub filled_slots: i64,
}

pub async fn list_events_handler(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<Vec<EventListItemView>>> {
    let events = event_service::list_events(&state.pool, query.category.as_deref()).await?;
    Ok(Json(events))
}

pub async fn get_event_handler(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
) -> Result<Json<EventDetailView>> {
    let event = event_service::get_event(&state.pool, &event_id).await?;
    Ok(Json(event))
}

pub async fn create_event_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<CreateEventInput>,
) -> Result<Json<EventView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let event = event_service::create_event(&state.pool, body).await?;
    Ok(Json(event))
}

pub async fn update_event_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    Json(body): Json<UpdateEventInput>,
) -> Result<Json<EventView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let event = event_service::update_event(&state.pool, &event_id, body).await?;
    Ok(Json(event))
}

pub async fn adjust_slots_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    Json(body): Json<AdjustSlotsRequest>,
) -> Result<Json<EventView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let event =
        event_service::adjust_slots(&state.pool, &event_id, body.max_slots, body.filled_slots)
            .await?;
    Ok(Json(event))
}

pub async fn toggle_active_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
) -> Result<Json<EventView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let event = event_service::toggle_active(&state.pool, &event_id).await?;
    Ok(Json(event))
}

pub async fn toggle_lock_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
) -> Result<Json<EventView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let event = event_service::toggle_lock(&state.pool, &event_id).await?;
    Ok(Json(event))
}

pub async fn delete_event_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    event_service::delete_event(&state.pool, &event_id).await?;
    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
