//! HTTP handlers for user management endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserCreateRequest, UserResponse, UserUpdateRequest},
    api::models::{ApiEnvelope, Pagination},
    auth::permissions,
    db::errors::DbError,
    db::handlers::{Repository, UserFilter, Users},
    errors::{Error, Result},
    types::{Operation, Resource, UserId},
};

/// The authenticated user's own profile.
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    summary = "Current user",
    responses(
        (status = 200, description = "The authenticated user", body = ApiEnvelope<UserResponse>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiEnvelope<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(user.into())))
}

/// List users. Admin only.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(Pagination),
    responses(
        (status = 200, description = "Paginated list of users", body = ApiEnvelope<Vec<UserResponse>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiEnvelope<Vec<UserResponse>>>> {
    permissions::require_admin(&current_user, Operation::Read, Resource::Users)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let filter = UserFilter {
        is_admin: None,
        limit: pagination.limit(),
        offset: pagination.offset(),
    };
    let total = repo.count(&filter).await?;
    let users = repo.list(&filter).await?;
    let responses: Vec<UserResponse> = users.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::paginated(responses, pagination.meta(total))))
}

/// Create a new user. Admin only.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = ApiEnvelope<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Username or email already taken"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<UserResponse>>)> {
    permissions::require_admin(&current_user, Operation::Create, Resource::Users)?;

    if !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: format!("Invalid email address: {}", request.email),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(user.into()))))
}

/// Get a user by ID. Admins can read anyone; users can read themselves.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = ApiEnvelope<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiEnvelope<UserResponse>>> {
    permissions::require_admin_or_self(&current_user, id, Operation::Read, Resource::Users)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(user.into())))
}

/// Update a user. Admins can update anyone; users can update their own
/// display name but never their own admin flag.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = ApiEnvelope<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<ApiEnvelope<UserResponse>>> {
    permissions::require_admin_or_self(&current_user, id, Operation::Update, Resource::Users)?;

    // Only admins may grant or revoke the admin flag
    if request.is_admin.is_some() && !current_user.is_admin {
        return Err(Error::InsufficientPermissions {
            required: crate::types::Permission::Allow(Resource::Users, Operation::Update),
            action: Operation::Update,
            resource: "admin flag".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let user = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(ApiEnvelope::ok(user.into())))
}

/// Delete a user along with their API keys and webhooks. Admin only.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    permissions::require_admin(&current_user, Operation::Delete, Resource::Users)?;

    if current_user.id == id {
        return Err(Error::BadRequest {
            message: "Cannot delete your own account".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut conn);

    let deleted = repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "User deleted")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_server, create_test_user_with_key};
    use axum::http::{HeaderName, HeaderValue};
    use serde_json::json;
    use sqlx::PgPool;

    fn bearer(secret: &str) -> (HeaderName, HeaderValue) {
        (
            axum::http::header::AUTHORIZATION,
            format!("Bearer {secret}").parse().unwrap(),
        )
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_returns_authenticated_user(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (user, secret) = create_test_user_with_key(&pool, "alice", false).await;
        let auth = bearer(&secret);

        let response = server.get("/api/v1/users/me").add_header(auth.0, auth.1).await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["id"], user.id.to_string());
        assert_eq!(body["data"]["username"], "alice");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_non_admin_cannot_touch_other_users(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_alice, alice_secret) = create_test_user_with_key(&pool, "alice", false).await;
        let (bob, _bob_secret) = create_test_user_with_key(&pool, "bob", false).await;
        let auth = bearer(&alice_secret);

        let response = server
            .get(&format!("/api/v1/users/{}", bob.id))
            .add_header(auth.0.clone(), auth.1.clone())
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
        assert_eq!(response.json::<serde_json::Value>()["errorCode"], "FORBIDDEN");

        let response = server
            .put(&format!("/api/v1/users/{}", bob.id))
            .add_header(auth.0, auth.1)
            .json(&json!({ "display_name": "Hijacked" }))
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_cannot_grant_self_admin(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (alice, secret) = create_test_user_with_key(&pool, "alice", false).await;
        let auth = bearer(&secret);

        // Updating own display name is fine
        let response = server
            .put(&format!("/api/v1/users/{}", alice.id))
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "display_name": "Alice" }))
            .await;
        response.assert_status_ok();

        // Flipping the admin flag is not
        let response = server
            .put(&format!("/api/v1/users/{}", alice.id))
            .add_header(auth.0, auth.1)
            .json(&json!({ "is_admin": true }))
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_manages_users(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_admin, secret) = create_test_user_with_key(&pool, "admin", true).await;
        let auth = bearer(&secret);

        let response = server
            .post("/api/v1/users")
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "username": "carol", "email": "carol@example.com" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let carol_id = response.json::<serde_json::Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = server
            .put(&format!("/api/v1/users/{carol_id}"))
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "is_admin": true }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["data"]["is_admin"], true);

        server
            .delete(&format!("/api/v1/users/{carol_id}"))
            .add_header(auth.0, auth.1)
            .await
            .assert_status_ok();
    }
}
