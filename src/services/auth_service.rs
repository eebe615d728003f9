use jsonwebtoken::{
    decode, encode, get_current_timestamp, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::env;
use uuid::Uuid;

use crate::database::{profile_repo, user_repo};
use crate::error::{ApiError, Result};
use crate::models::{ProfileRow, RegistrationType, ReviewStatus, Role, UserRow};
use crate::state::AppState;

/// Session cookie lifetime: 7 days.
pub const SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub provider_url: String,
    pub provider_api_key: String,
    pub cookie_secure: bool,
    pub session_ttl_secs: u64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let provider_url = env::var("SUPABASE_URL").expect("SUPABASE_URL must be set");
        let provider_api_key = env::var("SUPABASE_KEY").expect("SUPABASE_KEY must be set");
        let cookie_secure = env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);

        Self {
            jwt_secret,
            provider_url,
            provider_api_key,
            cookie_secure,
            session_ttl_secs: SESSION_TTL_SECS,
        }
    }
}

/// Signed session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// The identity provider's view of a verified user.
#[derive(Debug, Deserialize)]
pub struct ProviderUser {
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: ProviderUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderUserMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
}

pub struct ValidatedSession {
    pub user: UserRow,
    pub profile: Option<ProfileRow>,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUserView {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub registration_type: Option<RegistrationType>,
    pub profile: Option<SessionProfileView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfileView {
    pub status: ReviewStatus,
    pub college_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfoView {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub registration_type: Option<RegistrationType>,
    pub is_blocked: bool,
    pub profile: Option<ProfileSummaryView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummaryView {
    pub id: i64,
    pub contact: String,
    pub college_name: String,
    pub status: ReviewStatus,
    pub created_at: String,
}

/// Exchange an identity-provider token for a local user plus a signed
/// session token, provisioning the user on first login.
pub async fn validate_token(
    state: &AppState,
    access_token: &str,
    registration_type: Option<RegistrationType>,
) -> Result<ValidatedSession> {
    let provider_user = verify_provider_token(state, access_token).await?;
    let email = provider_user
        .email
        .clone()
        .ok_or_else(|| ApiError::Unauthenticated("identity provider returned no email".into()))?;

    if is_user_blocked(&state.pool, &email).await? {
        return Err(ApiError::Unauthenticated(
            "your account has been blocked, please contact support".into(),
        ));
    }

    let name = provider_display_name(&provider_user, &email);
    let (user, profile) =
        register_or_update_user(&state.pool, &email, &name, registration_type).await?;
    let token = issue_session_token(&state.auth, &user)?;

    Ok(ValidatedSession {
        user,
        profile,
        token,
    })
}

async fn verify_provider_token(state: &AppState, access_token: &str) -> Result<ProviderUser> {
    let url = format!(
        "{}/auth/v1/user",
        state.auth.provider_url.trim_end_matches('/')
    );
    let response = state
        .http
        .get(url)
        .header("apikey", &state.auth.provider_api_key)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(ApiError::Unauthenticated(
            "identity provider rejected the token".into(),
        ));
    }

    Ok(response.json::<ProviderUser>().await?)
}

fn provider_display_name(provider_user: &ProviderUser, email: &str) -> String {
    provider_user
        .user_metadata
        .full_name
        .clone()
        .or_else(|| provider_user.user_metadata.name.clone())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(email).to_string())
}

/// Look up or create the local user for a verified email. The registration
/// type is set at most once; a resubmission after a profile exists is an
/// error.
pub async fn register_or_update_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    registration_type: Option<RegistrationType>,
) -> Result<(UserRow, Option<ProfileRow>)> {
    let Some(user) = user_repo::find_by_email(pool, email).await? else {
        let role = determine_role(registration_type);
        let user_id = Uuid::new_v4().to_string();
        user_repo::insert(
            pool,
            user_repo::NewUser {
                user_id: &user_id,
                email,
                name,
                role,
                registration_type,
            },
        )
        .await?;
        let user = reload_user(pool, &user_id).await?;
        return Ok((user, None));
    };

    let profile = profile_repo::find_by_user_id(pool, &user.user_id).await?;

    if profile.is_some() && registration_type.is_some() {
        return Err(ApiError::InvalidRequest(
            "you have already registered, cannot register again".into(),
        ));
    }

    if let Some(registration_type) = registration_type {
        if user.registration_type.is_none() {
            user_repo::set_registration_type(pool, &user.user_id, registration_type).await?;
            let user = reload_user(pool, &user.user_id).await?;
            return Ok((user, profile));
        }
    }

    Ok((user, profile))
}

async fn reload_user(pool: &SqlitePool, user_id: &str) -> Result<UserRow> {
    user_repo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("user row missing after write".into()))
}

pub fn determine_role(registration_type: Option<RegistrationType>) -> Role {
    match registration_type {
        Some(RegistrationType::Principal) => Role::Prnc,
        Some(RegistrationType::Contingent) | None => Role::Cl,
    }
}

pub fn issue_session_token(config: &AuthConfig, user: &UserRow) -> Result<String> {
    let now = get_current_timestamp();
    let claims = SessionClaims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        role: user.role,
        iat: now,
        exp: now + config.session_ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign session token: {e}")))
}

pub fn verify_session_token(config: &AuthConfig, token: &str) -> Result<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::Unauthenticated(format!("invalid session token: {e}")))
}

pub fn session_user_view(user: &UserRow, profile: Option<&ProfileRow>) -> SessionUserView {
    SessionUserView {
        user_id: user.user_id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        registration_type: user.registration_type,
        profile: profile.map(|p| SessionProfileView {
            status: p.status,
            college_name: p.college_name.clone(),
        }),
    }
}

pub async fn get_user_info(pool: &SqlitePool, user_id: &str) -> Result<UserInfoView> {
    let user = user_repo::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("user not found".into()))?;
    let profile = profile_repo::find_by_user_id(pool, user_id).await?;

    Ok(UserInfoView {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        role: user.role,
        registration_type: user.registration_type,
        is_blocked: user.is_blocked == 1,
        profile: profile.map(|p| ProfileSummaryView {
            id: p.id,
            contact: p.contact,
            college_name: p.college_name,
            status: p.status,
            created_at: p.created_at,
        }),
    })
}

/// ADMIN is always allowed in; everyone else needs an approved profile.
pub async fn can_access_dashboard(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let Some(user) = user_repo::find_by_id(pool, user_id).await? else {
        return Ok(false);
    };
    if user.role == Role::Admin {
        return Ok(true);
    }
    let Some(profile) = profile_repo::find_by_user_id(pool, user_id).await? else {
        return Ok(false);
    };
    Ok(profile.status == ReviewStatus::Approved)
}

pub async fn block_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let updated = user_repo::set_blocked(pool, user_id, true).await?;
    if updated == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }
    Ok(())
}

pub async fn unblock_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let updated = user_repo::set_blocked(pool, user_id, false).await?;
    if updated == 0 {
        return Err(ApiError::NotFound("user not found".into()));
    }
    Ok(())
}

pub async fn is_user_blocked(pool: &SqlitePool, email: &str) -> Result<bool> {
    let user = user_repo::find_by_email(pool, email).await?;
    Ok(user.map(|u| u.is_blocked == 1).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema;
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

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            provider_url: "http://provider.invalid".to_string(),
            provider_api_key: String::new(),
            cookie_secure: false,
            session_ttl_secs: SESSION_TTL_SECS,
        }
    }

    #[test]
    fn role_derivation_from_registration_type() {
        assert_eq!(
            determine_role(Some(RegistrationType::Principal)),
            Role::Prnc
        );
        assert_eq!(determine_role(Some(RegistrationType::Contingent)), Role::Cl);
        assert_eq!(determine_role(None), Role::Cl);
    }

    #[tokio::test]
    async fn session_token_round_trips() {
        let pool = setup_pool().await;
        let (user, _) = register_or_update_user(&pool, "cl@fest.test", "Test CL", None)
            .await
            .unwrap();

        let config = test_config();
        let token = issue_session_token(&config, &user).unwrap();
        let claims = verify_session_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.email, "cl@fest.test");
        assert_eq!(claims.role, Role::Cl);
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let pool = setup_pool().await;
        let (user, _) = register_or_update_user(&pool, "cl@fest.test", "Test CL", None)
            .await
            .unwrap();

        let config = test_config();
        let token = issue_session_token(&config, &user).unwrap();

        let other = AuthConfig {
            jwt_secret: "other-secret".to_string(),
            ..test_config()
        };
        assert!(matches!(
            verify_session_token(&other, &token),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            verify_session_token(&config, "not-a-token"),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn first_login_creates_user_with_derived_role() {
        let pool = setup_pool().await;

        let (user, profile) = register_or_update_user(
            &pool,
            "prnc@fest.test",
            "A Principal",
            Some(RegistrationType::Principal),
        )
        .await
        .unwrap();

        assert_eq!(user.role, Role::Prnc);
        assert_eq!(user.registration_type, Some(RegistrationType::Principal));
        assert!(profile.is_none());

        // Second login without a registration type leaves the row alone.
        let (again, _) = register_or_update_user(&pool, "prnc@fest.test", "A Principal", None)
            .await
            .unwrap();
        assert_eq!(again.user_id, user.user_id);
        assert_eq!(again.role, Role::Prnc);
    }

    #[tokio::test]
    async fn registration_type_is_set_at_most_once() {
        let pool = setup_pool().await;

        let (user, _) = register_or_update_user(&pool, "cl@fest.test", "Test CL", None)
            .await
            .unwrap();
        assert_eq!(user.registration_type, None);

        let (user, _) = register_or_update_user(
            &pool,
            "cl@fest.test",
            "Test CL",
            Some(RegistrationType::Contingent),
        )
        .await
        .unwrap();
        assert_eq!(user.registration_type, Some(RegistrationType::Contingent));
        // Role was fixed at first login and does not change retroactively.
        assert_eq!(user.role, Role::Cl);
    }

    #[tokio::test]
    async fn resubmitting_registration_type_with_profile_fails() {
        let pool = setup_pool().await;

        let (user, _) = register_or_update_user(
            &pool,
            "cl@fest.test",
            "Test CL",
            Some(RegistrationType::Contingent),
        )
        .await
        .unwrap();

        profile_repo::insert(
            &pool,
            profile_repo::NewProfile {
                user_id: &user.user_id,
                contact: "9876543210",
                aadhaar_file_url: "https://files.test/aadhaar.pdf",
                college_id_url: "https://files.test/college-id.pdf",
                college_name: "Test College",
            },
        )
        .await
        .unwrap();

        let err = register_or_update_user(
            &pool,
            "cl@fest.test",
            "Test CL",
            Some(RegistrationType::Contingent),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn blocked_flag_round_trips() {
        let pool = setup_pool().await;
        let (user, _) = register_or_update_user(&pool, "cl@fest.test", "Test CL", None)
            .await
            .unwrap();

        assert!(!is_user_blocked(&pool, "cl@fest.test").await.unwrap());
        block_user(&pool, &user.user_id).await.unwrap();
        assert!(is_user_blocked(&pool, "cl@fest.test").await.unwrap());
        unblock_user(&pool, &user.user_id).await.unwrap();
        assert!(!is_user_blocked(&pool, "cl@fest.test").await.unwrap());

        // Unknown users are simply not blocked.
        assert!(!is_user_blocked(&pool, "nobody@fest.test").await.unwrap());
        assert!(matches!(
            block_user(&pool, "missing-id").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn dashboard_access_requires_admin_or_approved_profile() {
        let pool = setup_pool().await;

        let (cl, _) = register_or_update_user(&pool, "cl@fest.test", "Test CL", None)
            .await
            .unwrap();
        assert!(!can_access_dashboard(&pool, &cl.user_id).await.unwrap());

        let profile_id = profile_repo::insert(
            &pool,
            profile_repo::NewProfile {
                user_id: &cl.user_id,
                contact: "9876543210",
                aadhaar_file_url: "https://files.test/aadhaar.pdf",
                college_id_url: "https://files.test/college-id.pdf",
                college_name: "Test College",
            },
        )
        .await
        .unwrap();
        assert!(!can_access_dashboard(&pool, &cl.user_id).await.unwrap());

        profile_repo::set_status(&pool, profile_id, ReviewStatus::Approved, None)
            .await
            .unwrap();
        assert!(can_access_dashboard(&pool, &cl.user_id).await.unwrap());

        user_repo::insert(
            &pool,
            user_repo::NewUser {
                user_id: "admin-1",
                email: "admin@fest.test",
                name: "Admin",
                role: Role::Admin,
                registration_type: None,
            },
        )
        .await
        .unwrap();
        assert!(can_access_dashboard(&pool, "admin-1").await.unwrap());

        assert!(!can_access_dashboard(&pool, "missing").await.unwrap());
    }
}
