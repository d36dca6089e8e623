//! Request/response types for the HTTP API.

pub mod api_keys;
pub mod campaigns;
pub mod clients;
pub mod email_accounts;
pub mod envelope;
pub mod pagination;
pub mod users;
pub mod webhooks;

pub use envelope::ApiEnvelope;
pub use pagination::{Pagination, PaginationMeta};
