use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::database::profile_repo;
use crate::error::{ApiError, Result};
use crate::models::{ProfileRow, ProfileWithUserRow, ReviewStatus, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileInput {
    pub contact: String,
    pub aadhaar_file_url: String,
    pub college_id_url: String,
    pub college_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    pub contact: Option<String>,
    pub aadhaar_file_url: Option<String>,
    pub college_id_url: Option<String>,
    pub college_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: i64,
    pub user_id: String,
    pub contact: String,
    pub aadhaar_file_url: String,
    pub college_id_url: String,
    pub college_name: String,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileWithUserView {
    pub id: i64,
    pub user_id: String,
    pub contact: String,
    pub aadhaar_file_url: String,
    pub college_id_url: String,
    pub college_name: String,
    pub status: ReviewStatus,
    pub rejection_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user: ProfileUserView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUserView {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

fn profile_view(row: ProfileRow) -> ProfileView {
    ProfileView {
        id: row.id,
        user_id: row.user_id,
        contact: row.contact,
        aadhaar_file_url: row.aadhaar_file_url,
        college_id_url: row.college_id_url,
        college_name: row.college_name,
        status: row.status,
        rejection_reason: row.rejection_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn profile_with_user_view(row: ProfileWithUserRow) -> ProfileWithUserView {
    ProfileWithUserView {
        id: row.id,
        user_id: row.user_id.clone(),
        contact: row.contact,
        aadhaar_file_url: row.aadhaar_file_url,
        college_id_url: row.college_id_url,
        college_name: row.college_name,
        status: row.status,
        rejection_reason: row.rejection_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
        user: ProfileUserView {
            user_id: row.user_id,
            email: row.user_email,
            name: row.user_name,
            role: row.user_role,
        },
    }
}

fn validate_contact(contact: &str) -> Result<()> {
    if contact.len() != 10 || !contact.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::InvalidRequest("contact must be 10 digits".into()));
    }
    Ok(())
}

fn validate_college_name(college_name: &str) -> Result<()> {
    let len = college_name.trim().chars().count();
    if !(3..=200).contains(&len) {
        return Err(ApiError::InvalidRequest(
            "college name must be between 3 and 200 characters".into(),
        ));
    }
    Ok(())
}

pub async fn create_profile(
    pool: &SqlitePool,
    user_id: &str,
    input: CreateProfileInput,
) -> Result<ProfileView> {
    if profile_repo::find_by_user_id(pool, user_id).await?.is_some() {
        return Err(ApiError::InvalidRequest("profile already exists".into()));
    }

    validate_contact(&input.contact)?;
    validate_college_name(&input.college_name)?;
    if input.aadhaar_file_url.trim().is_empty() || input.college_id_url.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "document urls are required".into(),
        ));
    }

    let id = profile_repo::insert(
        pool,
        profile_repo::NewProfile {
            user_id,
            contact: &input.contact,
            aadhaar_file_url: input.aadhaar_file_url.trim(),
            college_id_url: input.college_id_url.trim(),
            college_name: input.college_name.trim(),
        },
    )
    .await?;

    Ok(profile_view(require_profile(pool, id).await?))
}

pub async fn my_profile(pool: &SqlitePool, user_id: &str) -> Result<ProfileWithUserView> {
    let row = profile_repo::find_with_user_by_user_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".into()))?;
    Ok(profile_with_user_view(row))
}

/// Owner resubmission: only a rejected profile may be edited, and editing
/// puts it back in the review queue.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    input: UpdateProfileInput,
) -> Result<ProfileView> {
    let profile = profile_repo::find_by_user_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".into()))?;

    if profile.status != ReviewStatus::Rejected {
        return Err(ApiError::Forbidden(
            "can only update rejected profiles".into(),
        ));
    }

    if let Some(contact) = input.contact.as_deref() {
        validate_contact(contact)?;
    }
    if let Some(college_name) = input.college_name.as_deref() {
        validate_college_name(college_name)?;
    }

    let patch = profile_repo::ProfilePatch {
        contact: input.contact,
        aadhaar_file_url: input.aadhaar_file_url,
        college_id_url: input.college_id_url,
        college_name: input.college_name,
    };
    profile_repo::resubmit(pool, user_id, &patch).await?;

    Ok(profile_view(require_profile(pool, profile.id).await?))
}

pub async fn list_profiles(
    pool: &SqlitePool,
    status: Option<ReviewStatus>,
    search: Option<&str>,
) -> Result<Vec<ProfileWithUserView>> {
    let q_like = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(q) => format!("%{}%", q.to_lowercase()),
        None => String::new(),
    };
    let rows = profile_repo::list(pool, status, &q_like).await?;
    Ok(rows.into_iter().map(profile_with_user_view).collect())
}

pub async fn get_profile(pool: &SqlitePool, id: i64) -> Result<ProfileWithUserView> {
    let row = profile_repo::find_with_user(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".into()))?;
    Ok(profile_with_user_view(row))
}

pub async fn approve_profile(pool: &SqlitePool, id: i64) -> Result<ProfileView> {
    let profile = require_profile(pool, id).await?;

    if profile.status == ReviewStatus::Approved {
        return Err(ApiError::InvalidRequest("profile already approved".into()));
    }

    profile_repo::set_status(pool, id, ReviewStatus::Approved, None).await?;
    Ok(profile_view(require_profile(pool, id).await?))
}

pub async fn reject_profile(
    pool: &SqlitePool,
    id: i64,
    rejection_reason: Option<&str>,
) -> Result<ProfileView> {
    let profile = require_profile(pool, id).await?;

    if profile.status == ReviewStatus::Rejected {
        return Err(ApiError::InvalidRequest("profile already rejected".into()));
    }

    profile_repo::set_status(pool, id, ReviewStatus::Rejected, rejection_reason).await?;
    Ok(profile_view(require_profile(pool, id).await?))
}

async fn require_profile(pool: &SqlitePool, id: i64) -> Result<ProfileRow> {
    profile_repo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("profile not found".into()))
}
