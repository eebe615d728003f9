use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};
use cookie::Cookie;
use http::header;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, Result};
use crate::models::{RegistrationType, Role};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::middleware::auth::{require_role, AuthenticatedUser};

const SESSION_COOKIE: &str = "access_token";

#[derive(Debug, Deserialize)]
pub struct ValidateTokenRequest {
    pub access_token: String,
    pub registration_type: Option<RegistrationType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: String,
}

fn session_cookie(state: &AppState, value: &str, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(cookie::SameSite::Lax);
    cookie.set_secure(state.auth.cookie_secure);
    cookie.set_max_age(cookie::time::Duration::seconds(max_age_secs));
    cookie
}

/// Public token exchange: provider token in, session cookie out.
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(body): Json<ValidateTokenRequest>,
) -> Result<Response> {
    if body.access_token.trim().is_empty() {
        return Err(ApiError::Unauthenticated("access token is required".into()));
    }

    let session =
        auth_service::validate_token(&state, &body.access_token, body.registration_type).await?;

    let cookie = session_cookie(
        &state,
        &session.token,
        state.auth.session_ttl_secs as i64,
    );
    let user = auth_service::session_user_view(&session.user, session.profile.as_ref());

    let mut response = Json(json!({ "user": user })).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse().unwrap());
    Ok(response)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<auth_service::UserInfoView>> {
    let info = auth_service::get_user_info(&state.pool, &auth_user.user_id).await?;
    Ok(Json(info))
}

pub async fn can_access_dashboard_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
) -> Result<Json<serde_json::Value>> {
    let can_access = auth_service::can_access_dashboard(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "canAccess": can_access })))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(_auth_user): Extension<AuthenticatedUser>,
) -> Response {
    // Expire the cookie immediately.
    let cookie = session_cookie(&state, "", 0);

    let mut response = Json(json!({ "message": "Logged out successfully" })).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse().unwrap());
    response
}

pub async fn block_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<UserIdRequest>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    if body.user_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest("userId is required".into()));
    }

    auth_service::block_user(&state.pool, &body.user_id).await?;
    Ok(Json(json!({ "message": "User blocked successfully" })))
}

pub async fn unblock_user_handler(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Json(body): Json<UserIdRequest>,
) -> Result<Json<serde_json::Value>> {
    require_role(&auth_user, &[Role::Admin])?;
    if body.user_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest("userId is required".into()));
    }

    auth_service::unblock_user(&state.pool, &body.user_id).await?;
    Ok(Json(json!({ "message": "User unblocked successfully" })))
}
