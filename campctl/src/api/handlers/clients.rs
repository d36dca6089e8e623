//! HTTP handlers for client (tenant) management endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::clients::{
        ClientCreateRequest, ClientListQuery, ClientResponse, ClientStatisticsResponse, ClientUpdateRequest,
    },
    api::models::users::CurrentUser,
    api::models::{ApiEnvelope, Pagination},
    auth::permissions,
    db::errors::DbError,
    db::handlers::{ClientFilter, Clients, Repository, Stats},
    errors::{Error, Result},
    types::{ClientId, Operation, Resource},
};

/// List clients with optional search, paginated.
#[utoipa::path(
    get,
    path = "/clients",
    tag = "clients",
    summary = "List clients",
    params(ClientListQuery, Pagination),
    responses(
        (status = 200, description = "Paginated list of clients", body = ApiEnvelope<Vec<ClientResponse>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_clients(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ClientListQuery>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ApiEnvelope<Vec<ClientResponse>>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Clients::new(&mut conn);

    let filter = ClientFilter {
        search: query.search,
        limit: pagination.limit(),
        offset: pagination.offset(),
    };
    let total = repo.count(&filter).await?;
    let clients = repo.list(&filter).await?;
    let responses: Vec<ClientResponse> = clients.into_iter().map(Into::into).collect();

    Ok(Json(ApiEnvelope::paginated(responses, pagination.meta(total))))
}

/// Create a new client.
#[utoipa::path(
    post,
    path = "/clients",
    tag = "clients",
    summary = "Create client",
    request_body = ClientCreateRequest,
    responses(
        (status = 201, description = "Client created", body = ApiEnvelope<ClientResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Client name already exists"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_client(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ClientCreateRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<ClientResponse>>)> {
    permissions::require_admin(&current_user, Operation::Create, Resource::Clients)?;

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Client name must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Clients::new(&mut conn);

    let client = repo.create(&request.into()).await?;

    Ok((StatusCode::CREATED, Json(ApiEnvelope::ok(client.into()))))
}

/// Get a client by ID.
#[utoipa::path(
    get,
    path = "/clients/{id}",
    tag = "clients",
    summary = "Get client",
    params(("id" = uuid::Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client details", body = ApiEnvelope<ClientResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Client not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_client(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<ClientId>,
) -> Result<Json<ApiEnvelope<ClientResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Clients::new(&mut conn);

    let client = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Client".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::ok(client.into())))
}

/// Update a client.
#[utoipa::path(
    put,
    path = "/clients/{id}",
    tag = "clients",
    summary = "Update client",
    params(("id" = uuid::Uuid, Path, description = "Client ID")),
    request_body = ClientUpdateRequest,
    responses(
        (status = 200, description = "Client updated", body = ApiEnvelope<ClientResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Client not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_client(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ClientId>,
    Json(request): Json<ClientUpdateRequest>,
) -> Result<Json<ApiEnvelope<ClientResponse>>> {
    permissions::require_admin(&current_user, Operation::Update, Resource::Clients)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Clients::new(&mut conn);

    let client = repo.update(id, &request.into()).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Client".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(Json(ApiEnvelope::ok(client.into())))
}

/// Delete a client. Fails with 400 while campaigns or email accounts still
/// reference it.
#[utoipa::path(
    delete,
    path = "/clients/{id}",
    tag = "clients",
    summary = "Delete client",
    params(("id" = uuid::Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client deleted"),
        (status = 400, description = "Client still referenced by campaigns or email accounts"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Client not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_client(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ClientId>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>> {
    permissions::require_admin(&current_user, Operation::Delete, Resource::Clients)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Clients::new(&mut conn);

    let deleted = repo.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "Client".to_string(),
            id: id.to_string(),
        });
    }

    Ok(Json(ApiEnvelope::ok_with_message(serde_json::json!({}), "Client deleted")))
}

/// Aggregate statistics for a client across all of its campaigns.
#[utoipa::path(
    get,
    path = "/clients/{id}/statistics",
    tag = "clients",
    summary = "Client statistics",
    params(("id" = uuid::Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Aggregated statistics", body = ApiEnvelope<ClientStatisticsResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Client not found"),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn client_statistics(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<ClientId>,
) -> Result<Json<ApiEnvelope<ClientStatisticsResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // 404 for unknown clients rather than an all-zero rollup
    let mut clients = Clients::new(&mut conn);
    if clients.get_by_id(id).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Client".to_string(),
            id: id.to_string(),
        });
    }

    let rollup = Stats::new(&mut conn).client_rollup(id).await?;

    Ok(Json(ApiEnvelope::ok(ClientStatisticsResponse::from_rollup(id, rollup))))
}
