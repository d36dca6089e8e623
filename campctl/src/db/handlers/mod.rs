//! Repositories wrapping raw connection access per table.

pub mod api_keys;
pub mod campaigns;
pub mod clients;
pub mod email_accounts;
pub mod repository;
pub mod stats;
pub mod users;
pub mod webhooks;

pub use api_keys::ApiKeys;
pub use campaigns::{CampaignFilter, Campaigns};
pub use clients::{ClientFilter, Clients};
pub use email_accounts::EmailAccounts;
pub use repository::Repository;
pub use stats::Stats;
pub use users::{UserFilter, Users};
pub use webhooks::Webhooks;
