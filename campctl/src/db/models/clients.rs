//! Database models for clients (tenant organizations).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::ClientId;

/// Database model for a client (tenant) record.
#[derive(Debug, Clone, FromRow)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub contact_email: Option<String>,
    pub company: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new client.
#[derive(Debug, Clone)]
pub struct ClientCreateDBRequest {
    pub name: String,
    pub contact_email: Option<String>,
    pub company: Option<String>,
}

/// Request to update a client.
///
/// Outer `Option` means "field present in the request"; for nullable columns
/// the inner `Option` distinguishes "set to value" from "clear".
#[derive(Debug, Clone, Default)]
pub struct ClientUpdateDBRequest {
    pub name: Option<String>,
    pub contact_email: Option<Option<String>>,
    pub company: Option<Option<String>>,
}

/// Aggregate statistics for a client across all of its campaigns.
#[derive(Debug, Clone, FromRow)]
pub struct ClientRollup {
    pub campaign_count: i64,
    pub email_account_count: i64,
    pub sent_count: i64,
    pub open_count: i64,
    pub reply_count: i64,
    pub bounce_count: i64,
}
