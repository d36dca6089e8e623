//! HTTP handlers for campaign management endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::campaigns::{
        CampaignCreateRequest, CampaignListQuery, CampaignResponse, CampaignStatisticsResponse, CampaignUpdateRequest,
    },
    api::models::users::CurrentUser,
    api::models::{ApiEnvelope, Pagination},
    auth::permissions,
    db::errors::DbError,
    db::handlers::{CampaignFilter, Campaigns, EmailAccounts, Repository},
    errors::{Error, Result},
    types::{CampaignId, ClientId, EmailAccountId, Operation, Resource},
};

/// Every linked account must exist and belong to the campaign's client.
async fn validate_account_links(
    conn: &mut sqlx::PgConnection,
    client_id: ClientId,
    account_ids: &[EmailAccountId],
) -> Result<()> {
    if account_ids.is_empty() {
        return Ok(());
    }

    let accounts = EmailAccounts::new(conn).list_by_ids(account_ids).await?;

    for id in account_ids {
        match accounts.iter().find(|a| a.id == *id) {
            None => {
                return Err(Error::BadRequest {
                    message: format!("Email account {id} does not exist"),
                });
            }
            Some(account) if account.client_id != client_id => {
                return Err(Error::BadRequest {
                    message: format!("Email account {id} belongs to a different client"),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// List campaigns with optional filters, paginated.
#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "campaigns",
    summary = "List campaigns",
    params(CampaignListQuery, Pagination),
    responses(
        (status = 200, description = "Paginated list of campaigns", body = ApiEnvelope<Vec<CampaignResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<CampaignListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiEnvelope<Vec<CampaignResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Campaigns::new(&mut conn);

    let filter = CampaignFilter {
        client_id: query.client_id,
        status: query.status,
        tag: query.tag,
        limit: pagination.limit(),
        offset: pagination.offset(),
    };
    let total = repo.count(&filter).await?;
    let campaigns = repo.list(&filter).await?;
    let responses: Vec<CampaignResponse> = campaigns.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::paginated(responses, pagination.meta(total))))
}

/// Create a new campaign.
#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "campaigns",
    summary = "Create campaign",
    request_body = CampaignCreateRequest,
    responses(
        (status = 201, description = "Campaign created", body = ApiEnvelope<CampaignResponse>),
        (status = 400, description = "Unknown client or invalid account links"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_campaign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CampaignCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<CampaignResponse>>)> {
    permissions::require_admin(&current_user, Operation::Create, Resource::Campaigns)?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Campaign name must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    validate_account_links(&mut conn, request.client_id, &request.email_account_ids).await?;

    let mut repo = Campaigns::new(&mut conn);
    let campaign = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(campaign.into()))))
}

/// Get a campaign by ID.
#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaigns",
    summary = "Get campaign",
    params(("id" = uuid::Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign details", body = ApiEnvelope<CampaignResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Campaign not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_campaign(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<CampaignId>,
) -> Result<Json<ApiEnvelope<CampaignResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Campaigns::new(&mut conn);

    let campaign = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Campaign".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(campaign.into())))
}

/// Update a campaign.
#[utoipa::path(
    put,
    path = "/campaigns/{id}",
    tag = "campaigns",
    summary = "Update campaign",
    params(("id" = uuid::Uuid, Path, description = "Campaign ID")),
    request_body = CampaignUpdateRequest,
    responses(
        (status = 200, description = "Campaign updated", body = ApiEnvelope<CampaignResponse>),
        (status = 400, description = "Invalid account links"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Campaign not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_campaign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CampaignId>,
    Json(request): Json<CampaignUpdateRequest>,
) -> Result<Json<ApiEnvelope<CampaignResponse>>> {
    permissions::require_admin(&current_user, Operation::Update, Resource::Campaigns)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let existing = Campaigns::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        })?;

    if let Some(ref account_ids) = request.email_account_ids {
        validate_account_links(&mut conn, existing.client_id, account_ids).await?;
    }

    let mut repo = Campaigns::new(&mut conn);
    let campaign = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(ApiEnvelope::ok(campaign.into())))
}

/// Delete a campaign.
#[utoipa::path(
    delete,
    path = "/campaigns/{id}",
    tag = "campaigns",
    summary = "Delete campaign",
    params(("id" = uuid::Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Campaign not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CampaignId>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    permissions::require_admin(&current_user, Operation::Delete, Resource::Campaigns)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Campaigns::new(&mut conn);

    let deleted = repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "Campaign deleted")))
}

/// Campaign statistics: raw counters and derived rates.
#[utoipa::path(
    get,
    path = "/campaigns/{id}/statistics",
    tag = "campaigns",
    summary = "Campaign statistics",
    params(("id" = uuid::Uuid, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Counters and rates", body = ApiEnvelope<CampaignStatisticsResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Campaign not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn campaign_statistics(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<CampaignId>,
) -> Result<Json<ApiEnvelope<CampaignStatisticsResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Campaigns::new(&mut conn);

    let campaign = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Campaign".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(CampaignStatisticsResponse::from(&campaign))))
}
