//! HTTP handlers for API key management, nested under users.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    AppState,
    api::models::ApiEnvelope,
    api::models::api_keys::{ApiKeyCreateRequest, ApiKeyResponse, ApiKeyWithSecretResponse},
    api::models::users::CurrentUser,
    auth::permissions,
    crypto,
    db::handlers::ApiKeys,
    db::models::api_keys::ApiKeyCreateDBRequest,
    errors::{Error, Result},
    types::{ApiKeyId, Operation, Resource, UserId},
};

#[derive(Debug, Deserialize)]
pub struct UserKeyPathParams {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UserKeyIdPathParams {
    pub user_id: UserId,
    pub key_id: ApiKeyId,
}

/// List a user's API keys. Secrets are never included.
#[utoipa::path(
    get,
    path = "/users/{user_id}/api-keys",
    tag = "api-keys",
    summary = "List API keys",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "API keys without secrets", body = ApiEnvelope<Vec<ApiKeyResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_api_keys(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(params): Path<UserKeyPathParams>,
) -> Result<Json<ApiEnvelope<Vec<ApiKeyResponse>>>> {
    permissions::require_admin_or_self(&current_user, params.user_id, Operation::Read, Resource::ApiKeys)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut conn);

    let keys = repo.list_by_user(params.user_id).await?;
    let responses: Vec<ApiKeyResponse> = keys.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::ok(responses)))
}

/// Create an API key for a user. The secret is returned once and cannot be
/// retrieved again.
#[utoipa::path(
    post,
    path = "/users/{user_id}/api-keys",
    tag = "api-keys",
    summary = "Create API key",
    params(("user_id" = uuid::Uuid, Path, description = "User ID")),
    request_body = ApiKeyCreateRequest,
    responses(
        (status = 201, description = "API key created, secret included", body = ApiEnvelope<ApiKeyWithSecretResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_api_key(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(params): Path<UserKeyPathParams>,
    Json(request): Json<ApiKeyCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<ApiKeyWithSecretResponse>>)> {
    // The path user is the target; an explicit body user_id must match it
    if request.user_id.is_some_and(|id| id != params.user_id) {
        return Err(Error::BadRequest {
            message: "user_id in body does not match path".to_string(),
        });
    }
    permissions::require_admin_or_self(&current_user, params.user_id, Operation::Create, Resource::ApiKeys)?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "API key name must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut conn);

    let key = repo
        .create(&ApiKeyCreateDBRequest {
            user_id: params.user_id,
            name: request.name,
            secret: crypto::generate_api_key(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(
            key.into(),
            "Store this secret now; it will not be shown again",
        )),
    ))
}

/// Revoke an API key.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/api-keys/{key_id}",
    tag = "api-keys",
    summary = "Revoke API key",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User ID"),
        ("key_id" = uuid::Uuid, Path, description = "API key ID"),
    ),
    responses(
        (status = 200, description = "API key revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "API key not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_api_key(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(params): Path<UserKeyIdPathParams>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    permissions::require_admin_or_self(&current_user, params.user_id, Operation::Delete, Resource::ApiKeys)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut conn);

    // Keys live under their owner; a key from another user is not found here
    let key = repo.get_by_id(params.key_id).await?;
    match key {
        Some(key) if key.user_id == params.user_id => {}
        _ => {
            return Err(Error::NotFound {
                resource: "API key".to_string(),
                id: params.key_id.to_string(),
            });
        }
    }

    repo.delete(params.key_id).await?;

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "API key revoked")))
}
