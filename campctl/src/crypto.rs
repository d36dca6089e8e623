//! Secret generation for API keys and webhook secrets.

use rand::{Rng, distr::Alphanumeric};

/// Prefix for generated API keys, so keys are recognizable in logs and
/// secret scanners.
const API_KEY_PREFIX: &str = "cmp_";

/// Prefix for generated webhook signing secrets.
const WEBHOOK_SECRET_PREFIX: &str = "whsec_";

fn random_token(len: usize) -> String {
    rand::rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generate a new API key secret.
pub fn generate_api_key() -> String {
    format!("{API_KEY_PREFIX}{}", random_token(40))
}

/// Generate a new webhook secret.
pub fn generate_webhook_secret() -> String {
    format!("{WEBHOOK_SECRET_PREFIX}{}", random_token(32))
}
