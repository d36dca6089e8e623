//! API request/response types for email accounts and their events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::email_accounts::{
    EmailAccount, EmailAccountCreateDBRequest, EmailAccountSortKey, EmailAccountStatsRow,
    EmailAccountUpdateDBRequest, EmailEventType, SortOrder, WarmupStats,
};
use crate::types::{CampaignId, ClientId, EmailAccountId};

/// Daily send limit applied when a create request omits one. Must match the
/// `daily_limit` column default in the initial schema migration.
pub const DEFAULT_DAILY_LIMIT: i32 = 50;

/// Request body for creating an email account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmailAccountCreateRequest {
    #[schema(value_type = Uuid)]
    pub client_id: ClientId,
    pub address: String,
    pub display_name: Option<String>,
    pub provider: Option<String>,
    /// Defaults to [`DEFAULT_DAILY_LIMIT`] messages per day when omitted
    pub daily_limit: Option<i32>,
    #[serde(default)]
    pub warmup_enabled: bool,
}

impl From<EmailAccountCreateRequest> for EmailAccountCreateDBRequest {
    fn from(request: EmailAccountCreateRequest) -> Self {
        Self {
            client_id: request.client_id,
            address: request.address,
            display_name: request.display_name,
            provider: request.provider,
            daily_limit: request.daily_limit.unwrap_or(DEFAULT_DAILY_LIMIT),
            warmup_enabled: request.warmup_enabled,
        }
    }
}

/// Request body for updating an email account. Absent fields are untouched;
/// an explicit `null` clears nullable fields.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmailAccountUpdateRequest {
    #[serde(default, with = "serde_with::rust::double_option")]
    pub display_name: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub provider: Option<Option<String>>,
    pub daily_limit: Option<i32>,
    pub warmup_enabled: Option<bool>,
    pub warmup_stage: Option<i32>,
}

impl From<EmailAccountUpdateRequest> for EmailAccountUpdateDBRequest {
    fn from(request: EmailAccountUpdateRequest) -> Self {
        Self {
            display_name: request.display_name,
            provider: request.provider,
            daily_limit: request.daily_limit,
            warmup_enabled: request.warmup_enabled,
            warmup_stage: request.warmup_stage,
        }
    }
}

/// Query parameters for the email account listing, which always carries
/// per-account statistics.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EmailAccountListQuery {
    #[param(value_type = Option<Uuid>)]
    pub client_id: Option<ClientId>,
    pub warmup_enabled: Option<bool>,
    /// Case-insensitive substring match over address and display name
    pub search: Option<String>,
    /// Only count events at or after this instant (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Only count events before this instant (RFC 3339)
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sort_by: EmailAccountSortKey,
    #[serde(default)]
    pub order: SortOrder,
}

/// Time range parameters for warmup statistics.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct TimeRangeQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// An email account as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmailAccountResponse {
    #[schema(value_type = Uuid)]
    pub id: EmailAccountId,
    #[schema(value_type = Uuid)]
    pub client_id: ClientId,
    pub address: String,
    pub display_name: Option<String>,
    pub provider: Option<String>,
    pub daily_limit: i32,
    pub warmup_enabled: bool,
    pub warmup_stage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EmailAccount> for EmailAccountResponse {
    fn from(account: EmailAccount) -> Self {
        Self {
            id: account.id,
            client_id: account.client_id,
            address: account.address,
            display_name: account.display_name,
            provider: account.provider,
            daily_limit: account.daily_limit,
            warmup_enabled: account.warmup_enabled,
            warmup_stage: account.warmup_stage,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// An email account with event aggregates for the requested time range.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmailAccountWithStatsResponse {
    #[serde(flatten)]
    pub account: EmailAccountResponse,
    pub sent_count: i64,
    pub bounce_count: i64,
    pub warmup_sent: i64,
    pub warmup_replies: i64,
    pub warmup_spam_saved: i64,
}

impl From<EmailAccountStatsRow> for EmailAccountWithStatsResponse {
    fn from(row: EmailAccountStatsRow) -> Self {
        Self {
            account: EmailAccountResponse {
                id: row.id,
                client_id: row.client_id,
                address: row.address,
                display_name: row.display_name,
                provider: row.provider,
                daily_limit: row.daily_limit,
                warmup_enabled: row.warmup_enabled,
                warmup_stage: row.warmup_stage,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            sent_count: row.sent_count,
            bounce_count: row.bounce_count,
            warmup_sent: row.warmup_sent,
            warmup_replies: row.warmup_replies,
            warmup_spam_saved: row.warmup_spam_saved,
        }
    }
}

/// Request body for recording an email event against an account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmailEventCreateRequest {
    pub event_type: EmailEventType,
    /// Campaign to attribute the event to; required for campaign counters
    /// to move
    #[schema(value_type = Option<Uuid>)]
    pub campaign_id: Option<CampaignId>,
    /// Defaults to now when omitted
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Warmup statistics for one account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WarmupStatisticsResponse {
    #[schema(value_type = Uuid)]
    pub account_id: EmailAccountId,
    pub warmup_sent: i64,
    pub warmup_replies: i64,
    pub warmup_spam_saved: i64,
}

impl WarmupStatisticsResponse {
    pub fn from_stats(account_id: EmailAccountId, stats: WarmupStats) -> Self {
        Self {
            account_id,
            warmup_sent: stats.warmup_sent,
            warmup_replies: stats.warmup_replies,
            warmup_spam_saved: stats.warmup_spam_saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults_daily_limit() {
        let request: EmailAccountCreateRequest = serde_json::from_value(serde_json::json!({
            "client_id": uuid::Uuid::new_v4(),
            "address": "sender@example.com",
        }))
        .unwrap();
        assert_eq!(request.daily_limit, None);

        let db_request = EmailAccountCreateDBRequest::from(request);
        assert_eq!(db_request.daily_limit, DEFAULT_DAILY_LIMIT);
        assert!(!db_request.warmup_enabled);
    }
}
