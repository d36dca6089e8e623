//! API request/response types for users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::users::{User, UserCreateDBRequest, UserUpdateDBRequest};
use crate::types::UserId;

/// The authenticated user attached to a request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = Uuid)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
}

/// Request body for creating a user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<UserCreateRequest> for UserCreateDBRequest {
    fn from(request: UserCreateRequest) -> Self {
        Self {
            username: request.username,
            email: request.email,
            display_name: request.display_name,
            is_admin: request.is_admin,
        }
    }
}

/// Request body for updating a user. A field that is absent is left
/// untouched; `display_name: null` clears the value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    #[serde(default, with = "serde_with::rust::double_option")]
    pub display_name: Option<Option<String>>,
    pub is_admin: Option<bool>,
}

impl From<UserUpdateRequest> for UserUpdateDBRequest {
    fn from(request: UserUpdateRequest) -> Self {
        Self {
            display_name: request.display_name,
            is_admin: request.is_admin,
        }
    }
}

/// A user as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = Uuid)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
