use super::status::ReviewStatus;
use super::users::Role;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
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

/// Profile joined with its owning user, for admin review listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileWithUserRow {
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
    pub user_email: String,
    pub user_name: String,
    pub user_role: Role,
}
