use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::models::{ReviewStatus, Role};
use crate::services::profile_service::{
    self, CreateProfileInput, ProfileWithUserView, UpdateProfileInput,
};
use crate::state::AppState;
use crate::web::middleware::auth::{require_role, AuthenticatedUser};

#[derive(Debug, Default, Deserialize)]
pub struct ProfileListQuery {
    pub status: Option<ReviewStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectProfileRequest {
    pub rejection_reason: Option<String>,
}

pub async fn create_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<CreateProfileInput>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Cl, Role::Prnc])?;
    let profile = profile_service::create_profile(&state.pool, &auth_user.user_id, body).await?;
    Ok(Json(json!({
        "message": "Profile created successfully",
        "profile": profile,
    })))
}

pub async fn my_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<ProfileWithUserView>> {
    let profile = profile_service::my_profile(&state.pool, &auth_user.user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<UpdateProfileInput>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Cl, Role::Prnc])?;
    let profile = profile_service::update_profile(&state.pool, &auth_user.user_id, body).await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile,
    })))
}

pub async fn list_profiles_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Query(query): Query<ProfileListQuery>,
) -> Result<Json<Vec<ProfileWithUserView>>> {
    require_role(&auth_user, &[Role::Admin])?;
    let profiles =
        profile_service::list_profiles(&state.pool, query.status, query.search.as_deref()).await?;
    Ok(Json(profiles))
}

pub async fn get_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileWithUserView>> {
    require_role(&auth_user, &[Role::Admin])?;
    let profile = profile_service::get_profile(&state.pool, id).await?;
    Ok(Json(profile))
}

pub async fn approve_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    let profile = profile_service::approve_profile(&state.pool, id).await?;
    Ok(Json(json!({
        "message": "Profile approved successfully",
        "profile": profile,
    })))
}

pub async fn reject_profile_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    body: Option<Json<RejectProfileRequest>>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let profile =
        profile_service::reject_profile(&state.pool, id, body.rejection_reason.as_deref()).await?;
    Ok(Json(json!({
        "message": "Profile rejected successfully",
        "profile": profile,
    })))
}
