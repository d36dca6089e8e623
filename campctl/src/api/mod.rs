//! HTTP API: routing, handlers, and request/response models.

pub mod handlers;
pub mod models;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// The versioned API router, mounted under `/api/v1`.
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/clients/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/clients/{id}/statistics", get(handlers::clients::client_statistics))
        .route(
            "/campaigns",
            get(handlers::campaigns::list_campaigns).post(handlers::campaigns::create_campaign),
        )
        .route(
            "/campaigns/{id}",
            get(handlers::campaigns::get_campaign)
                .put(handlers::campaigns::update_campaign)
                .delete(handlers::campaigns::delete_campaign),
        )
        .route(
            "/campaigns/{id}/statistics",
            get(handlers::campaigns::campaign_statistics),
        )
        .route(
            "/email-accounts",
            get(handlers::email_accounts::list_email_accounts).post(handlers::email_accounts::create_email_account),
        )
        .route(
            "/email-accounts/{id}",
            get(handlers::email_accounts::get_email_account)
                .put(handlers::email_accounts::update_email_account)
                .delete(handlers::email_accounts::delete_email_account),
        )
        .route(
            "/email-accounts/{id}/events",
            post(handlers::email_accounts::record_email_event),
        )
        .route(
            "/email-accounts/{id}/warmup-statistics",
            get(handlers::email_accounts::warmup_statistics),
        )
        .route("/users/me", get(handlers::users::get_me))
        .route("/users", get(handlers::users::list_users).post(handlers::users::create_user))
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/users/{user_id}/api-keys",
            get(handlers::api_keys::list_api_keys).post(handlers::api_keys::create_api_key),
        )
        .route(
            "/users/{user_id}/api-keys/{key_id}",
            axum::routing::delete(handlers::api_keys::delete_api_key),
        )
        .route(
            "/webhooks",
            get(handlers::webhooks::list_webhooks).post(handlers::webhooks::create_webhook),
        )
        .route(
            "/webhooks/{id}",
            get(handlers::webhooks::get_webhook)
                .put(handlers::webhooks::update_webhook)
                .delete(handlers::webhooks::delete_webhook),
        )
        .route(
            "/webhooks/{id}/rotate-secret",
            post(handlers::webhooks::rotate_webhook_secret),
        )
}
