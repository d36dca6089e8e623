//! Authentication and authorization.
//!
//! Every API request carries an API key as a bearer token; the
//! [`crate::api::models::users::CurrentUser`] extractor resolves it to a user
//! and handlers apply the checks in [`permissions`].

pub mod current_user;
pub mod permissions;

pub use permissions::{require_admin, require_admin_or_self};
