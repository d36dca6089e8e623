//! API request/response types for clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::clients::{Client, ClientCreateDBRequest, ClientRollup, ClientUpdateDBRequest};
use crate::types::ClientId;

/// Request body for creating a client.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClientCreateRequest {
    pub name: String,
    pub contact_email: Option<String>,
    pub company: Option<String>,
}

impl From<ClientCreateRequest> for ClientCreateDBRequest {
    fn from(request: ClientCreateRequest) -> Self {
        Self {
            name: request.name,
            contact_email: request.contact_email,
            company: request.company,
        }
    }
}

/// Request body for updating a client. Absent fields are untouched; an
/// explicit `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClientUpdateRequest {
    pub name: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub company: Option<Option<String>>,
}

impl From<ClientUpdateRequest> for ClientUpdateDBRequest {
    fn from(request: ClientUpdateRequest) -> Self {
        Self {
            name: request.name,
            contact_email: request.contact_email,
            company: request.company,
        }
    }
}

/// Query parameters for listing clients.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ClientListQuery {
    /// Case-insensitive substring match over name and company
    pub search: Option<String>,
}

/// A client as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientResponse {
    #[schema(value_type = Uuid)]
    pub id: ClientId,
    pub name: String,
    pub contact_email: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            contact_email: client.contact_email,
            company: client.company,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

/// Aggregate statistics for a client across all of its campaigns.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClientStatisticsResponse {
    #[schema(value_type = Uuid)]
    pub client_id: ClientId,
    pub campaign_count: i64,
    pub email_account_count: i64,
    pub sent_count: i64,
    pub open_count: i64,
    pub reply_count: i64,
    pub bounce_count: i64,
}

impl ClientStatisticsResponse {
    pub fn from_rollup(client_id: ClientId, rollup: ClientRollup) -> Self {
        Self {
            client_id,
            campaign_count: rollup.campaign_count,
            email_account_count: rollup.email_account_count,
            sent_count: rollup.sent_count,
            open_count: rollup.open_count,
            reply_count: rollup.reply_count,
            bounce_count: rollup.bounce_count,
        }
    }
}
