//! HTTP handlers for webhook configuration endpoints.
//!
//! Webhooks belong to the user who created them. Delivery is out of scope;
//! this service only manages configuration and signing secrets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::ApiEnvelope,
    api::models::users::CurrentUser,
    api::models::webhooks::{
        WebhookCreateRequest, WebhookResponse, WebhookUpdateRequest, WebhookWithSecretResponse,
    },
    auth::permissions,
    crypto,
    db::errors::DbError,
    db::handlers::Webhooks,
    db::models::webhooks::{WebhookCreateDBRequest, WebhookUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, Resource, WebhookId},
};

fn validate_url(url: &str) -> Result<()> {
    if !url.starts_with("https://") {
        return Err(Error::BadRequest {
            message: "Webhook URL must use HTTPS".to_string(),
        });
    }
    Ok(())
}

/// Load a webhook and check the caller may act on it.
async fn get_owned_webhook(
    conn: &mut sqlx::PgConnection,
    current_user: &CurrentUser,
    id: WebhookId,
    action: Operation,
) -> Result<crate::db::models::webhooks::Webhook> {
    let webhook = Webhooks::new(conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Webhook".to_string(),
        id: id.to_string(),
    })?;
    permissions::require_admin_or_self(current_user, webhook.user_id, action, Resource::Webhooks)?;
    Ok(webhook)
}

/// List the authenticated user's webhooks. Secrets are never included.
#[utoipa::path(
    get,
    path = "/webhooks",
    tag = "webhooks",
    summary = "List webhooks",
    responses(
        (status = 200, description = "The caller's webhooks", body = ApiEnvelope<Vec<WebhookResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_webhooks(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiEnvelope<Vec<WebhookResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Webhooks::new(&mut conn);

    let webhooks = repo.list_by_user(current_user.id).await?;
    let responses: Vec<WebhookResponse> = webhooks.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::ok(responses)))
}

/// Create a webhook owned by the authenticated user. Returns the signing
/// secret, which is only shown once.
#[utoipa::path(
    post,
    path = "/webhooks",
    tag = "webhooks",
    summary = "Create webhook",
    request_body = WebhookCreateRequest,
    responses(
        (status = 201, description = "Webhook created, secret included", body = ApiEnvelope<WebhookWithSecretResponse>),
        (status = 400, description = "URL is not HTTPS"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_webhook(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<WebhookCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<WebhookWithSecretResponse>>)> {
    validate_url(&request.url)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Webhooks::new(&mut conn);

    let webhook = repo
        .create(&WebhookCreateDBRequest {
            user_id: current_user.id,
            url: request.url,
            secret: crypto::generate_webhook_secret(),
            event_types: request
                .event_types
                .map(|types| types.iter().map(|t| t.as_str().to_string()).collect()),
            description: request.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(
            webhook.into(),
            "Store this secret now; it will not be shown again",
        )),
    ))
}

/// Get a webhook by ID.
#[utoipa::path(
    get,
    path = "/webhooks/{id}",
    tag = "webhooks",
    summary = "Get webhook",
    params(("id" = uuid::Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Webhook details", body = ApiEnvelope<WebhookResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Webhook not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_webhook(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiEnvelope<WebhookResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let webhook = get_owned_webhook(&mut conn, &current_user, id, Operation::Read).await?;

    Ok(Json(ApiEnvelope::ok(webhook.into())))
}

/// Update a webhook.
#[utoipa::path(
    put,
    path = "/webhooks/{id}",
    tag = "webhooks",
    summary = "Update webhook",
    params(("id" = uuid::Uuid, Path, description = "Webhook ID")),
    request_body = WebhookUpdateRequest,
    responses(
        (status = 200, description = "Webhook updated", body = ApiEnvelope<WebhookResponse>),
        (status = 400, description = "URL is not HTTPS"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Webhook not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_webhook(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<WebhookId>,
    Json(request): Json<WebhookUpdateRequest>,
) -> Result<Json<ApiEnvelope<WebhookResponse>>> {
    if let Some(ref url) = request.url {
        validate_url(url)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    get_owned_webhook(&mut conn, &current_user, id, Operation::Update).await?;

    let db_request = WebhookUpdateDBRequest {
        url: request.url,
        enabled: request.enabled,
        event_types: request
            .event_types
            .map(|outer| outer.map(|types| types.iter().map(|t| t.as_str().to_string()).collect())),
        description: request.description,
    };

    let mut repo = Webhooks::new(&mut conn);
    let webhook = repo.update(id, &db_request).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Webhook".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(ApiEnvelope::ok(webhook.into())))
}

/// Delete a webhook.
#[utoipa::path(
    delete,
    path = "/webhooks/{id}",
    tag = "webhooks",
    summary = "Delete webhook",
    params(("id" = uuid::Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Webhook deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Webhook not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_webhook(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    get_owned_webhook(&mut conn, &current_user, id, Operation::Delete).await?;

    Webhooks::new(&mut conn).delete(id).await?;

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "Webhook deleted")))
}

/// Rotate a webhook's signing secret. The new secret is only shown once.
#[utoipa::path(
    post,
    path = "/webhooks/{id}/rotate-secret",
    tag = "webhooks",
    summary = "Rotate webhook secret",
    params(("id" = uuid::Uuid, Path, description = "Webhook ID")),
    responses(
        (status = 200, description = "Secret rotated, new secret included", body = ApiEnvelope<WebhookWithSecretResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Webhook not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn rotate_webhook_secret(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<WebhookId>,
) -> Result<Json<ApiEnvelope<WebhookWithSecretResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    get_owned_webhook(&mut conn, &current_user, id, Operation::Update).await?;

    let mut repo = Webhooks::new(&mut conn);
    let webhook = repo.rotate_secret(id, &crypto::generate_webhook_secret()).await?;

    Ok(Json(ApiEnvelope::ok_with_message(
        webhook.into(),
        "Store this secret now; it will not be shown again",
    )))
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
    async fn test_secret_only_shown_at_creation(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_user, secret) = create_test_user_with_key(&pool, "alice", false).await;
        let auth = bearer(&secret);

        let response = server
            .post("/api/v1/webhooks")
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "url": "https://example.com/hook" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        let webhook_secret = body["data"]["secret"].as_str().unwrap();
        assert!(webhook_secret.starts_with("whsec_"));
        let id = body["data"]["id"].as_str().unwrap().to_string();

        // Subsequent reads omit the secret
        let response = server
            .get(&format!("/api/v1/webhooks/{id}"))
            .add_header(auth.0.clone(), auth.1.clone())
            .await;
        response.assert_status_ok();
        assert!(response.json::<serde_json::Value>()["data"].get("secret").is_none());

        // Rotation mints a fresh one
        let response = server
            .post(&format!("/api/v1/webhooks/{id}/rotate-secret"))
            .add_header(auth.0, auth.1)
            .await;
        response.assert_status_ok();
        let rotated = response.json::<serde_json::Value>();
        assert_ne!(rotated["data"]["secret"].as_str().unwrap(), webhook_secret);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_http_url_rejected(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_user, secret) = create_test_user_with_key(&pool, "alice", false).await;
        let auth = bearer(&secret);

        let response = server
            .post("/api/v1/webhooks")
            .add_header(auth.0, auth.1)
            .json(&json!({ "url": "http://example.com/hook" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_webhooks_are_scoped_to_owner(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_alice, alice_secret) = create_test_user_with_key(&pool, "alice", false).await;
        let (_bob, bob_secret) = create_test_user_with_key(&pool, "bob", false).await;
        let alice_auth = bearer(&alice_secret);
        let bob_auth = bearer(&bob_secret);

        let response = server
            .post("/api/v1/webhooks")
            .add_header(alice_auth.0.clone(), alice_auth.1.clone())
            .json(&json!({ "url": "https://example.com/hook" }))
            .await;
        let id = response.json::<serde_json::Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        // Bob sees an empty list and cannot touch Alice's webhook
        let response = server
            .get("/api/v1/webhooks")
            .add_header(bob_auth.0.clone(), bob_auth.1.clone())
            .await;
        assert_eq!(response.json::<serde_json::Value>()["data"].as_array().unwrap().len(), 0);

        let response = server
            .delete(&format!("/api/v1/webhooks/{id}"))
            .add_header(bob_auth.0, bob_auth.1)
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);

        // Alice still can
        server
            .delete(&format!("/api/v1/webhooks/{id}"))
            .add_header(alice_auth.0, alice_auth.1)
            .await
            .assert_status_ok();
    }
}
