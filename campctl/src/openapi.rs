//! OpenAPI documentation for the management API.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::handlers;
use crate::api::models::{
    api_keys::{ApiKeyCreateRequest, ApiKeyResponse, ApiKeyWithSecretResponse},
    campaigns::{CampaignCreateRequest, CampaignResponse, CampaignStatisticsResponse, CampaignUpdateRequest},
    clients::{ClientCreateRequest, ClientResponse, ClientStatisticsResponse, ClientUpdateRequest},
    email_accounts::{
        EmailAccountCreateRequest, EmailAccountResponse, EmailAccountUpdateRequest, EmailAccountWithStatsResponse,
        EmailEventCreateRequest, WarmupStatisticsResponse,
    },
    pagination::PaginationMeta,
    users::{UserCreateRequest, UserResponse, UserUpdateRequest},
    webhooks::{WebhookCreateRequest, WebhookResponse, WebhookUpdateRequest, WebhookWithSecretResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "campctl API",
        description = "Multi-tenant email campaign management API",
        version = env!("CARGO_PKG_VERSION"),
    ),
    servers(
        (url = "/api/v1", description = "Versioned API root")
    ),
    paths(
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::client_statistics,
        handlers::campaigns::list_campaigns,
        handlers::campaigns::create_campaign,
        handlers::campaigns::get_campaign,
        handlers::campaigns::update_campaign,
        handlers::campaigns::delete_campaign,
        handlers::campaigns::campaign_statistics,
        handlers::email_accounts::list_email_accounts,
        handlers::email_accounts::create_email_account,
        handlers::email_accounts::get_email_account,
        handlers::email_accounts::update_email_account,
        handlers::email_accounts::delete_email_account,
        handlers::email_accounts::record_email_event,
        handlers::email_accounts::warmup_statistics,
        handlers::users::get_me,
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::api_keys::list_api_keys,
        handlers::api_keys::create_api_key,
        handlers::api_keys::delete_api_key,
        handlers::webhooks::list_webhooks,
        handlers::webhooks::create_webhook,
        handlers::webhooks::get_webhook,
        handlers::webhooks::update_webhook,
        handlers::webhooks::delete_webhook,
        handlers::webhooks::rotate_webhook_secret,
    ),
    components(schemas(
        ClientCreateRequest,
        ClientUpdateRequest,
        ClientResponse,
        ClientStatisticsResponse,
        CampaignCreateRequest,
        CampaignUpdateRequest,
        CampaignResponse,
        CampaignStatisticsResponse,
        EmailAccountCreateRequest,
        EmailAccountUpdateRequest,
        EmailAccountResponse,
        EmailAccountWithStatsResponse,
        EmailEventCreateRequest,
        WarmupStatisticsResponse,
        UserCreateRequest,
        UserUpdateRequest,
        UserResponse,
        ApiKeyCreateRequest,
        ApiKeyResponse,
        ApiKeyWithSecretResponse,
        WebhookCreateRequest,
        WebhookUpdateRequest,
        WebhookResponse,
        WebhookWithSecretResponse,
        PaginationMeta,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "clients", description = "Tenant organization management"),
        (name = "campaigns", description = "Campaign management and statistics"),
        (name = "email-accounts", description = "Sending mailboxes, events, and warmup"),
        (name = "users", description = "User account management"),
        (name = "api-keys", description = "API key management"),
        (name = "webhooks", description = "Webhook configuration"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
