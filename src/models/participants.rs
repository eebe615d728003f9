use super::status::ReviewStatus;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
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
}

/// Participant joined with its owning CL and event, for listings and detail
/// responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantDetailRow {
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
    pub cl_name: String,
    pub cl_email: String,
    pub event_name: String,
    pub event_category: String,
}
