//! Common type definitions and permission system types.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`ClientId`]: Tenant organization identifier
//! - [`CampaignId`]: Campaign identifier
//! - [`EmailAccountId`]: Sending mailbox identifier
//! - [`UserId`]: User account identifier
//! - [`ApiKeyId`]: API key identifier
//! - [`WebhookId`]: Webhook configuration identifier
//!
//! The permission types ([`Resource`], [`Operation`], [`Permission`]) are used
//! in authorization errors so that a 403 names exactly what was required.

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type ClientId = Uuid;
pub type CampaignId = Uuid;
pub type EmailAccountId = Uuid;
pub type UserId = Uuid;
pub type ApiKeyId = Uuid;
pub type WebhookId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Clients,
    Campaigns,
    EmailAccounts,
    Users,
    ApiKeys,
    Webhooks,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// The caller must own the specific resource instance
    Owner,
    /// Logical combinator: any of the contained permissions suffices
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Clients => write!(f, "clients"),
            Resource::Campaigns => write!(f, "campaigns"),
            Resource::EmailAccounts => write!(f, "email accounts"),
            Resource::Users => write!(f, "users"),
            Resource::ApiKeys => write!(f, "API keys"),
            Resource::Webhooks => write!(f, "webhooks"),
        }
    }
}
