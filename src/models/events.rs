#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub event_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
    pub filled_slots: i64,
    pub is_active: i64,
    pub is_locked: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Event plus the live count of pending registrations, for the listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventWithCountsRow {
    pub event_id: String,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub min_team_size: i64,
    pub max_team_size: i64,
    pub max_slots: i64,
    pub filled_slots: i64,
    pub is_active: i64,
    pub is_locked: i64,
    pub created_at: String,
    pub updated_at: String,
    pub pending_count: i64,
}
