//! API request/response types for API keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::api_keys::ApiKey;
use crate::types::{ApiKeyId, UserId};

/// Request body for creating an API key.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApiKeyCreateRequest {
    pub name: String,
    /// Defaults to the authenticated user; only admins may mint keys for
    /// someone else
    #[schema(value_type = Option<Uuid>)]
    pub user_id: Option<UserId>,
}

/// An API key as returned by list/get. The secret is never included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiKeyResponse {
    #[schema(value_type = Uuid)]
    pub id: ApiKeyId,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            user_id: key.user_id,
            name: key.name,
            created_at: key.created_at,
        }
    }
}

/// Returned once, at creation, with the plaintext secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiKeyWithSecretResponse {
    #[schema(value_type = Uuid)]
    pub id: ApiKeyId,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub name: String,
    pub secret: String,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKey> for ApiKeyWithSecretResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            user_id: key.user_id,
            name: key.name,
            secret: key.secret,
            created_at: key.created_at,
        }
    }
}
