use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::models::Role;
use crate::services::auth_service;
use crate::state::AppState;

/// Immutable authenticated identity, attached to the request by the
/// middleware. Never stored anywhere else.
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = token_from_request(&request) else {
        return ApiError::Unauthenticated("missing session token".into()).into_response();
    };

    match auth_service::verify_session_token(&state.auth, &token) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthenticatedUser {
                user_id: claims.sub,
                email: claims.email,
                role: claims.role,
            });
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

// Cookie first, bearer header as the fallback.
fn token_from_request(request: &Request) -> Option<String> {
    let from_cookie = request
        .headers()
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find(|c| c.starts_with("access_token="))
                .and_then(|c| c.strip_prefix("access_token="))
        })
        .map(str::to_string);

    if from_cookie.is_some() {
        return from_cookie;
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Explicit per-endpoint capability check. An empty role set admits every
/// authenticated caller.
pub fn require_role(user: &AuthenticatedUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.is_empty() || allowed.contains(&user.role) {
        return Ok(());
    }
    Err(ApiError::Forbidden(format!(
        "user {} lacks the required role",
        user.email
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "u-1".to_string(),
            email: "u@fest.test".to_string(),
            role,
        }
    }

    #[test]
    fn empty_role_set_admits_everyone() {
        assert!(require_role(&user(Role::Cl), &[]).is_ok());
        assert!(require_role(&user(Role::Admin), &[]).is_ok());
    }

    #[test]
    fn mismatched_role_is_forbidden() {
        assert!(require_role(&user(Role::Admin), &[Role::Admin]).is_ok());
        assert!(require_role(&user(Role::Prnc), &[Role::Cl, Role::Prnc]).is_ok());
        assert!(matches!(
            require_role(&user(Role::Cl), &[Role::Admin]),
            Err(ApiError::Forbidden(_))
        ));
    }
}
