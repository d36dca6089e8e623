//! API request/response types for webhooks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::webhooks::{Webhook, WebhookEventType};
use crate::types::{UserId, WebhookId};

/// Request body for creating a webhook.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookCreateRequest {
    /// Must be an https:// URL
    pub url: String,
    /// Event types to deliver; omit to receive everything
    pub event_types: Option<Vec<WebhookEventType>>,
    pub description: Option<String>,
}

/// Request body for updating a webhook. Absent fields are untouched;
/// `event_types: null` resets the filter to "all events".
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct WebhookUpdateRequest {
    pub url: Option<String>,
    pub enabled: Option<bool>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub event_types: Option<Option<Vec<WebhookEventType>>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
}

/// A webhook as returned by list/get. The signing secret is never included.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookResponse {
    #[schema(value_type = Uuid)]
    pub id: WebhookId,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub url: String,
    pub enabled: bool,
    pub event_types: Option<Vec<String>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Webhook> for WebhookResponse {
    fn from(webhook: Webhook) -> Self {
        let event_types = webhook
            .event_types
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Self {
            id: webhook.id,
            user_id: webhook.user_id,
            url: webhook.url,
            enabled: webhook.enabled,
            event_types,
            description: webhook.description,
            created_at: webhook.created_at,
            updated_at: webhook.updated_at,
        }
    }
}

/// Returned at creation and on secret rotation, with the signing secret.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WebhookWithSecretResponse {
    #[serde(flatten)]
    pub webhook: WebhookResponse,
    pub secret: String,
}

impl From<Webhook> for WebhookWithSecretResponse {
    fn from(webhook: Webhook) -> Self {
        let secret = webhook.secret.clone();
        Self {
            webhook: webhook.into(),
            secret,
        }
    }
}
