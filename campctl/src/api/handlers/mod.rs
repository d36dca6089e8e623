//! HTTP request handlers.

pub mod api_keys;
pub mod campaigns;
pub mod clients;
pub mod email_accounts;
pub mod users;
pub mod webhooks;

use axum::response::Json;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
