//! Database models for email accounts (sending mailboxes) and their events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{CampaignId, ClientId, EmailAccountId};

/// Database model for a sending mailbox.
#[derive(Debug, Clone, FromRow)]
pub struct EmailAccount {
    pub id: EmailAccountId,
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

/// An email account row joined with statistics aggregated from
/// `email_events`, optionally restricted to a time range.
#[derive(Debug, Clone, FromRow)]
pub struct EmailAccountStatsRow {
    pub id: EmailAccountId,
    pub client_id: ClientId,
    pub address: String,
    pub display_name: Option<String>,
    pub provider: Option<String>,
    pub daily_limit: i32,
    pub warmup_enabled: bool,
    pub warmup_stage: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sent_count: i64,
    pub bounce_count: i64,
    pub warmup_sent: i64,
    pub warmup_replies: i64,
    pub warmup_spam_saved: i64,
}

/// Warmup counters for a single account.
#[derive(Debug, Clone, FromRow)]
pub struct WarmupStats {
    pub warmup_sent: i64,
    pub warmup_replies: i64,
    pub warmup_spam_saved: i64,
}

/// Request to create a new email account.
#[derive(Debug, Clone)]
pub struct EmailAccountCreateDBRequest {
    pub client_id: ClientId,
    pub address: String,
    pub display_name: Option<String>,
    pub provider: Option<String>,
    pub daily_limit: i32,
    pub warmup_enabled: bool,
}

/// Request to update an email account.
#[derive(Debug, Clone, Default)]
pub struct EmailAccountUpdateDBRequest {
    pub display_name: Option<Option<String>>,
    pub provider: Option<Option<String>>,
    pub daily_limit: Option<i32>,
    pub warmup_enabled: Option<bool>,
    pub warmup_stage: Option<i32>,
}

/// Event types recorded against an email account.
///
/// `Sent`/`Open`/`Reply`/`Bounce` also bump the corresponding campaign
/// counter when the event carries a campaign ID; warmup events never touch
/// campaigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmailEventType {
    Sent,
    Open,
    Reply,
    Bounce,
    WarmupSent,
    WarmupReply,
    WarmupSpamSave,
}

impl EmailEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Open => "open",
            Self::Reply => "reply",
            Self::Bounce => "bounce",
            Self::WarmupSent => "warmup_sent",
            Self::WarmupReply => "warmup_reply",
            Self::WarmupSpamSave => "warmup_spam_save",
        }
    }

    /// The campaign counter column this event type increments, if any.
    pub fn campaign_counter_column(&self) -> Option<&'static str> {
        match self {
            Self::Sent => Some("sent_count"),
            Self::Open => Some("open_count"),
            Self::Reply => Some("reply_count"),
            Self::Bounce => Some("bounce_count"),
            Self::WarmupSent | Self::WarmupReply | Self::WarmupSpamSave => None,
        }
    }
}

/// Request to record a new email event.
#[derive(Debug, Clone)]
pub struct EmailEventCreateDBRequest {
    pub account_id: EmailAccountId,
    pub campaign_id: Option<CampaignId>,
    pub event_type: EmailEventType,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Whitelisted sort columns for email account listings.
///
/// The variant-to-column mapping is the only place user-supplied sort input
/// meets SQL; identifiers are never interpolated from request strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmailAccountSortKey {
    #[default]
    CreatedAt,
    Address,
    SentCount,
    WarmupSent,
}

impl EmailAccountSortKey {
    pub fn as_sql_column(&self) -> &'static str {
        match self {
            Self::CreatedAt => "a.created_at",
            Self::Address => "a.address",
            Self::SentCount => "sent_count",
            Self::WarmupSent => "warmup_sent",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter for listing email accounts with aggregated statistics.
#[derive(Debug, Clone, Default)]
pub struct EmailAccountFilter {
    pub client_id: Option<ClientId>,
    pub warmup_enabled: Option<bool>,
    /// Case-insensitive substring match over address and display name
    pub search: Option<String>,
    /// Restrict statistics aggregation to events at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Restrict statistics aggregation to events before this instant
    pub to: Option<DateTime<Utc>>,
    pub sort_by: EmailAccountSortKey,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serde_matches_sql_literals() {
        // as_str() values are what the migration's CHECK constraint and the
        // aggregate FILTER clauses use; serde must agree with them
        for et in [
            EmailEventType::Sent,
            EmailEventType::Open,
            EmailEventType::Reply,
            EmailEventType::Bounce,
            EmailEventType::WarmupSent,
            EmailEventType::WarmupReply,
            EmailEventType::WarmupSpamSave,
        ] {
            let json = serde_json::to_value(et).unwrap();
            assert_eq!(json, serde_json::Value::String(et.as_str().to_string()));
        }
    }

    #[test]
    fn test_warmup_events_do_not_touch_campaigns() {
        assert!(EmailEventType::WarmupSent.campaign_counter_column().is_none());
        assert!(EmailEventType::WarmupSpamSave.campaign_counter_column().is_none());
        assert_eq!(EmailEventType::Open.campaign_counter_column(), Some("open_count"));
    }

    #[test]
    fn test_sort_key_columns_are_whitelisted() {
        // Every variant maps to a fixed identifier; this is the whitelist
        for key in [
            EmailAccountSortKey::CreatedAt,
            EmailAccountSortKey::Address,
            EmailAccountSortKey::SentCount,
            EmailAccountSortKey::WarmupSent,
        ] {
            assert!(!key.as_sql_column().is_empty());
            assert!(!key.as_sql_column().contains(';'));
        }
    }
}
