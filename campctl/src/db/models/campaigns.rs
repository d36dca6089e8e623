//! Database models for campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::types::{CampaignId, ClientId, EmailAccountId};

/// Campaign lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being composed, not yet sending
    Draft,
    /// Actively sending
    Active,
    /// Sending suspended, can resume
    Paused,
    /// Finished, read-only
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown campaign status: {}", s)),
        }
    }
}

/// Database model for a campaign.
///
/// `tags` and `email_account_ids` are JSONB arrays; use [`Campaign::tags`]
/// and [`Campaign::email_account_ids`] for typed access.
#[derive(Debug, Clone, FromRow)]
pub struct Campaign {
    pub id: CampaignId,
    pub client_id: ClientId,
    pub name: String,
    pub status: String,
    pub tags: serde_json::Value,
    pub email_account_ids: serde_json::Value,
    pub sent_count: i64,
    pub open_count: i64,
    pub reply_count: i64,
    pub bounce_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Get the parsed campaign status.
    pub fn campaign_status(&self) -> CampaignStatus {
        self.status.parse().unwrap_or(CampaignStatus::Draft)
    }

    /// Tags as a string list (empty on malformed JSON).
    pub fn tags(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }

    /// Linked email account IDs (empty on malformed JSON).
    pub fn email_account_ids(&self) -> Vec<EmailAccountId> {
        serde_json::from_value(self.email_account_ids.clone()).unwrap_or_default()
    }
}

/// Request to create a new campaign.
#[derive(Debug, Clone)]
pub struct CampaignCreateDBRequest {
    pub client_id: ClientId,
    pub name: String,
    pub status: CampaignStatus,
    pub tags: Vec<String>,
    pub email_account_ids: Vec<Uuid>,
}

/// Request to update a campaign.
#[derive(Debug, Clone, Default)]
pub struct CampaignUpdateDBRequest {
    pub name: Option<String>,
    pub status: Option<CampaignStatus>,
    pub tags: Option<Vec<String>>,
    pub email_account_ids: Option<Vec<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<CampaignStatus>().unwrap(), status);
        }
        assert!("archived".parse::<CampaignStatus>().is_err());
    }
}
