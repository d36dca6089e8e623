//! HTTP handlers for email account endpoints, including event recording and
//! statistics.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::email_accounts::{
        EmailAccountCreateRequest, EmailAccountListQuery, EmailAccountResponse, EmailAccountUpdateRequest,
        EmailAccountWithStatsResponse, EmailEventCreateRequest, TimeRangeQuery, WarmupStatisticsResponse,
    },
    api::models::users::CurrentUser,
    api::models::{ApiEnvelope, Pagination},
    auth::permissions,
    db::errors::DbError,
    db::handlers::{Campaigns, EmailAccounts, Repository},
    db::models::email_accounts::{EmailAccountFilter, EmailEventCreateDBRequest},
    errors::{Error, Result},
    types::{EmailAccountId, Operation, Resource},
};

/// List email accounts with per-account statistics.
///
/// The optional `from`/`to` range scopes the statistics columns only; which
/// accounts appear is unaffected.
#[utoipa::path(
    get,
    path = "/email-accounts",
    tag = "email-accounts",
    summary = "List email accounts with statistics",
    params(EmailAccountListQuery, Pagination),
    responses(
        (status = 200, description = "Paginated accounts with aggregates", body = ApiEnvelope<Vec<EmailAccountWithStatsResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_email_accounts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<EmailAccountListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiEnvelope<Vec<EmailAccountWithStatsResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    let filter = EmailAccountFilter {
        client_id: query.client_id,
        warmup_enabled: query.warmup_enabled,
        search: query.search,
        from: query.from,
        to: query.to,
        sort_by: query.sort_by,
        order: query.order,
        limit: pagination.limit(),
        offset: pagination.offset(),
    };
    let total = repo.count(&filter).await?;
    let rows = repo.list_with_stats(&filter).await?;
    let responses: Vec<EmailAccountWithStatsResponse> = rows.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::paginated(responses, pagination.meta(total))))
}

/// Create a new email account.
#[utoipa::path(
    post,
    path = "/email-accounts",
    tag = "email-accounts",
    summary = "Create email account",
    request_body = EmailAccountCreateRequest,
    responses(
        (status = 201, description = "Account created", body = ApiEnvelope<EmailAccountResponse>),
        (status = 400, description = "Unknown client or invalid address"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Address already registered"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_email_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<EmailAccountCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<EmailAccountResponse>>)> {
    permissions::require_admin(&current_user, Operation::Create, Resource::EmailAccounts)?;

    if !request.address.contains('@') {
        return Err(Error::BadRequest {
            message: format!("Invalid email address: {}", request.address),
        });
    }
    if request.daily_limit.is_some_and(|l| l <= 0) {
        return Err(Error::BadRequest {
            message: "Daily limit must be positive".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    let account = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(account.into()))))
}

/// Get an email account by ID.
#[utoipa::path(
    get,
    path = "/email-accounts/{id}",
    tag = "email-accounts",
    summary = "Get email account",
    params(("id" = uuid::Uuid, Path, description = "Email account ID")),
    responses(
        (status = 200, description = "Account details", body = ApiEnvelope<EmailAccountResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_email_account(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<EmailAccountId>,
) -> Result<Json<ApiEnvelope<EmailAccountResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    let account = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Email account".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(account.into())))
}

/// Update an email account.
#[utoipa::path(
    put,
    path = "/email-accounts/{id}",
    tag = "email-accounts",
    summary = "Update email account",
    params(("id" = uuid::Uuid, Path, description = "Email account ID")),
    request_body = EmailAccountUpdateRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiEnvelope<EmailAccountResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_email_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<EmailAccountId>,
    Json(request): Json<EmailAccountUpdateRequest>,
) -> Result<Json<ApiEnvelope<EmailAccountResponse>>> {
    permissions::require_admin(&current_user, Operation::Update, Resource::EmailAccounts)?;

    if request.daily_limit.is_some_and(|l| l <= 0) {
        return Err(Error::BadRequest {
            message: "Daily limit must be positive".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    let account = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Email account".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(ApiEnvelope::ok(account.into())))
}

/// Delete an email account and its event history.
#[utoipa::path(
    delete,
    path = "/email-accounts/{id}",
    tag = "email-accounts",
    summary = "Delete email account",
    params(("id" = uuid::Uuid, Path, description = "Email account ID")),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_email_account(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<EmailAccountId>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    permissions::require_admin(&current_user, Operation::Delete, Resource::EmailAccounts)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    let deleted = repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Email account".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "Email account deleted")))
}

/// Record an email event against an account.
#[utoipa::path(
    post,
    path = "/email-accounts/{id}/events",
    tag = "email-accounts",
    summary = "Record email event",
    params(("id" = uuid::Uuid, Path, description = "Email account ID")),
    request_body = EmailEventCreateRequest,
    responses(
        (status = 201, description = "Event recorded"),
        (status = 400, description = "Unknown campaign"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn record_email_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<EmailAccountId>,
    Json(request): Json<EmailEventCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<serde_json::Value>>)> {
    permissions::require_admin(&current_user, Operation::Create, Resource::EmailAccounts)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if EmailAccounts::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Email account".to_string(),
            id: id.to_string(),
        });
    }
    if let Some(campaign_id) = request.campaign_id
        && Campaigns::new(&mut conn).get_by_id(campaign_id).await?.is_none()
    {
        return Err(Error::BadRequest {
            message: format!("Campaign {campaign_id} does not exist"),
        });
    }

    let mut repo = EmailAccounts::new(&mut conn);
    repo.record_event(&EmailEventCreateDBRequest {
        account_id: id,
        campaign_id: request.campaign_id,
        event_type: request.event_type,
        occurred_at: request.occurred_at,
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "Event recorded")),
    ))
}

/// Warmup statistics for one account, optionally time-ranged.
#[utoipa::path(
    get,
    path = "/email-accounts/{id}/warmup-statistics",
    tag = "email-accounts",
    summary = "Warmup statistics",
    params(
        ("id" = uuid::Uuid, Path, description = "Email account ID"),
        TimeRangeQuery,
    ),
    responses(
        (status = 200, description = "Warmup counters", body = ApiEnvelope<WarmupStatisticsResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Account not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn warmup_statistics(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<EmailAccountId>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<ApiEnvelope<WarmupStatisticsResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = EmailAccounts::new(&mut conn);

    if repo.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Email account".to_string(),
            id: id.to_string(),
        });
    }

    let stats = repo.warmup_statistics(id, range.from, range.to).await?;

    Ok(Json(ApiEnvelope::ok(WarmupStatisticsResponse::from_stats(id, stats))))
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

    async fn create_client(server: &axum_test::TestServer, auth: &(HeaderName, HeaderValue), name: &str) -> String {
        let response = server
            .post("/api/v1/clients")
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "name": name }))
            .await;
        response.json::<serde_json::Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_listing_carries_statistics(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_admin, secret) = create_test_user_with_key(&pool, "admin", true).await;
        let auth = bearer(&secret);

        let client_id = create_client(&server, &auth, "Acme").await;

        let response = server
            .post("/api/v1/email-accounts")
            .add_header(auth.0.clone(), auth.1.clone())
            .json(&json!({ "client_id": client_id, "address": "sender@example.com", "warmup_enabled": true }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let account_id = response.json::<serde_json::Value>()["data"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        for event_type in ["sent", "sent", "warmup_sent"] {
            server
                .post(&format!("/api/v1/email-accounts/{account_id}/events"))
                .add_header(auth.0.clone(), auth.1.clone())
                .json(&json!({ "event_type": event_type }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = server
            .get("/api/v1/email-accounts?sort_by=sent_count&order=desc")
            .add_header(auth.0.clone(), auth.1.clone())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"][0]["sent_count"], 2);
        assert_eq!(body["data"][0]["warmup_sent"], 1);
        assert_eq!(body["pagination"]["totalCount"], 1);

        let response = server
            .get(&format!("/api/v1/email-accounts/{account_id}/warmup-statistics"))
            .add_header(auth.0, auth.1)
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["warmup_sent"], 1);
        assert_eq!(body["data"]["warmup_spam_saved"], 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_rejects_bad_address(pool: PgPool) {
        let server = create_test_server(pool.clone());
        let (_admin, secret) = create_test_user_with_key(&pool, "admin", true).await;
        let auth = bearer(&secret);

        let client_id = create_client(&server, &auth, "Acme").await;

        let response = server
            .post("/api/v1/email-accounts")
            .add_header(auth.0, auth.1)
            .json(&json!({ "client_id": client_id, "address": "not-an-address" }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errorCode"], "BAD_REQUEST");
    }
}
