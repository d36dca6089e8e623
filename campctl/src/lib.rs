//! # campctl: Email Campaign Control Backend
//!
//! `campctl` is a multi-tenant management backend for cold-email campaigns. It
//! exposes a versioned REST API over clients (tenant organizations),
//! campaigns, sending mailboxes, users, and webhook configuration, backed by
//! PostgreSQL through a thin repository layer.
//!
//! ## Overview
//!
//! Agencies running outreach for multiple clients need one place to manage
//! which mailboxes send for which campaign, how each campaign is performing,
//! and how far along each mailbox is in its warmup schedule. `campctl` is that
//! control surface: campaign and mailbox CRUD, an append-only email event
//! stream (sends, opens, replies, bounces, warmup activity), and a statistics
//! layer that aggregates those events per account, per campaign, and per
//! client, with optional time-range scoping.
//!
//! It deliberately does not send email and does not deliver webhooks; it
//! manages the configuration and the numbers.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence. Requests carry an
//! API key as a bearer token; the [`api::models::users::CurrentUser`]
//! extractor resolves it to a user and handlers apply admin/ownership checks.
//! Handlers talk to the database through per-entity repositories ([`db`]),
//! each wrapping a `&mut PgConnection`, so a handler can compose several
//! repository calls on one connection or transaction.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use campctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = campctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     campctl::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
pub mod test_utils;

use axum::{Router, http::HeaderValue, routing::get};
pub use config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::db::handlers::{ApiKeys, Repository, Users};
use crate::db::models::api_keys::ApiKeyCreateDBRequest;
use crate::db::models::users::UserCreateDBRequest;

pub use types::{ApiKeyId, CampaignId, ClientId, EmailAccountId, UserId, WebhookId};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the campctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Ensure the initial admin user exists, minting a bootstrap API key on first
/// startup.
///
/// Idempotent: if the admin user already exists nothing is changed and no key
/// is created. When no `admin_api_key` is configured, the generated secret is
/// logged once; it cannot be recovered later.
#[instrument(skip_all, fields(email = %config.admin_email))]
pub async fn create_initial_admin(config: &Config, pool: &PgPool) -> anyhow::Result<UserId> {
    let mut conn = pool.acquire().await?;
    let mut users = Users::new(&mut conn);

    if let Some(existing) = users.get_by_email(&config.admin_email).await? {
        return Ok(existing.id);
    }

    let username = config
        .admin_email
        .split('@')
        .next()
        .filter(|u| !u.is_empty())
        .unwrap_or("admin")
        .to_string();

    let admin = users
        .create(&UserCreateDBRequest {
            username,
            email: config.admin_email.clone(),
            display_name: None,
            is_admin: true,
        })
        .await?;

    let secret = config.admin_api_key.clone().unwrap_or_else(crypto::generate_api_key);
    let from_config = config.admin_api_key.is_some();

    ApiKeys::new(&mut conn)
        .create(&ApiKeyCreateDBRequest {
            user_id: admin.id,
            name: "bootstrap".to_string(),
            secret: secret.clone(),
        })
        .await?;

    if from_config {
        info!("Created initial admin user {} with configured API key", config.admin_email);
    } else {
        // Shown once; there is no way to retrieve it afterwards
        info!(
            "Created initial admin user {} with generated API key: {}",
            config.admin_email, secret
        );
    }

    Ok(admin.id)
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origin = if config.cors_allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = config
            .cors_allowed_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new().allow_origin(origin))
}

/// Build the application router: health probe, versioned API, and docs.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(api::handlers::health))
        .nest("/api/v1", api::v1_router())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", openapi::ApiDoc::openapi()).path("/docs"))
        .with_state(state)
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The running service: connection pool, migrations applied, router built.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance: connect, migrate, seed the admin
    /// user, and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.pool.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        migrator().run(&pool).await?;

        create_initial_admin(&config, &pool).await?;

        let state = AppState {
            db: pool.clone(),
            config: config.clone(),
        };
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application until the shutdown future resolves.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("campctl listening on http://{bind_addr}");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
