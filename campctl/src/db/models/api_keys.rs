//! Database models for API keys.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{ApiKeyId, UserId};

/// Database model for an API key. The `secret` is only ever surfaced once,
/// at creation time.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKey {
    pub id: ApiKeyId,
    pub user_id: UserId,
    pub name: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new API key.
#[derive(Debug, Clone)]
pub struct ApiKeyCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub secret: String,
}

/// Row returned when resolving a bearer secret during authentication:
/// the key's owning user, with the fields the request context needs.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyAuthRow {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}
