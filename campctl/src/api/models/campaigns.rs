//! API request/response types for campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::campaigns::{Campaign, CampaignCreateDBRequest, CampaignStatus, CampaignUpdateDBRequest};
use crate::types::{CampaignId, ClientId, EmailAccountId};

/// Request body for creating a campaign.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignCreateRequest {
    #[schema(value_type = Uuid)]
    pub client_id: ClientId,
    pub name: String,
    /// Defaults to `draft` when omitted
    pub status: Option<CampaignStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    #[schema(value_type = Vec<Uuid>)]
    pub email_account_ids: Vec<EmailAccountId>,
}

impl From<CampaignCreateRequest> for CampaignCreateDBRequest {
    fn from(request: CampaignCreateRequest) -> Self {
        Self {
            client_id: request.client_id,
            name: request.name,
            status: request.status.unwrap_or(CampaignStatus::Draft),
            tags: request.tags,
            email_account_ids: request.email_account_ids,
        }
    }
}

/// Request body for updating a campaign. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CampaignUpdateRequest {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
    pub tags: Option<Vec<String>>,
    #[schema(value_type = Option<Vec<Uuid>>)]
    pub email_account_ids: Option<Vec<EmailAccountId>>,
}

impl From<CampaignUpdateRequest> for CampaignUpdateDBRequest {
    fn from(request: CampaignUpdateRequest) -> Self {
        Self {
            name: request.name,
            status: request.status,
            tags: request.tags,
            email_account_ids: request.email_account_ids,
        }
    }
}

/// Query parameters for listing campaigns.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CampaignListQuery {
    #[param(value_type = Option<Uuid>)]
    pub client_id: Option<ClientId>,
    pub status: Option<CampaignStatus>,
    /// Matches campaigns tagged with this value
    pub tag: Option<String>,
}

/// A campaign as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignResponse {
    #[schema(value_type = Uuid)]
    pub id: CampaignId,
    #[schema(value_type = Uuid)]
    pub client_id: ClientId,
    pub name: String,
    pub status: CampaignStatus,
    pub tags: Vec<String>,
    #[schema(value_type = Vec<Uuid>)]
    pub email_account_ids: Vec<EmailAccountId>,
    pub sent_count: i64,
    pub open_count: i64,
    pub reply_count: i64,
    pub bounce_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        let status = campaign.campaign_status();
        let tags = campaign.tags();
        let email_account_ids = campaign.email_account_ids();
        Self {
            id: campaign.id,
            client_id: campaign.client_id,
            name: campaign.name,
            status,
            tags,
            email_account_ids,
            sent_count: campaign.sent_count,
            open_count: campaign.open_count,
            reply_count: campaign.reply_count,
            bounce_count: campaign.bounce_count,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

/// Derived statistics for a single campaign.
///
/// Rates are fractions of `sent_count` and 0.0 when nothing has been sent.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignStatisticsResponse {
    #[schema(value_type = Uuid)]
    pub campaign_id: CampaignId,
    pub sent_count: i64,
    pub open_count: i64,
    pub reply_count: i64,
    pub bounce_count: i64,
    pub open_rate: f64,
    pub reply_rate: f64,
    pub bounce_rate: f64,
}

impl From<&Campaign> for CampaignStatisticsResponse {
    fn from(campaign: &Campaign) -> Self {
        let rate = |count: i64| {
            if campaign.sent_count == 0 {
                0.0
            } else {
                count as f64 / campaign.sent_count as f64
            }
        };
        Self {
            campaign_id: campaign.id,
            sent_count: campaign.sent_count,
            open_count: campaign.open_count,
            reply_count: campaign.reply_count,
            bounce_count: campaign.bounce_count,
            open_rate: rate(campaign.open_count),
            reply_rate: rate(campaign.reply_count),
            bounce_rate: rate(campaign.bounce_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn campaign(sent: i64, open: i64) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            name: "c".to_string(),
            status: "active".to_string(),
            tags: serde_json::json!([]),
            email_account_ids: serde_json::json!([]),
            sent_count: sent,
            open_count: open,
            reply_count: 0,
            bounce_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rates() {
        let stats = CampaignStatisticsResponse::from(&campaign(200, 50));
        assert_eq!(stats.open_rate, 0.25);
        assert_eq!(stats.reply_rate, 0.0);
    }

    #[test]
    fn test_rates_zero_sent() {
        let stats = CampaignStatisticsResponse::from(&campaign(0, 0));
        assert_eq!(stats.open_rate, 0.0);
        assert_eq!(stats.bounce_rate, 0.0);
    }
}
