use sqlx::SqlitePool;

use crate::services::auth_service::AuthConfig;

/// Shared per-request state: connection pool, outbound HTTP client and auth
/// settings.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub http: reqwest::Client,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(pool: SqlitePool, auth: AuthConfig) -> Self {
        Self {
            pool,
            http: reqwest::Client::new(),
            auth,
        }
    }
}
