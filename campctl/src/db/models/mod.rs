//! Database record structures matching table schemas.

pub mod api_keys;
pub mod campaigns;
pub mod clients;
pub mod email_accounts;
pub mod users;
pub mod webhooks;
