//! Shared helpers for tests.

use sqlx::PgPool;

use crate::db::handlers::{ApiKeys, Repository, Users};
use crate::db::models::api_keys::ApiKeyCreateDBRequest;
use crate::db::models::users::{User, UserCreateDBRequest};
use crate::{AppState, Config};

/// Application state backed by the given pool and default configuration.
pub fn create_test_state(db: PgPool) -> AppState {
    AppState {
        db,
        config: Config::default(),
    }
}

/// A test server wrapping the full router.
pub fn create_test_server(db: PgPool) -> axum_test::TestServer {
    let router = crate::build_router(create_test_state(db)).expect("Failed to build router");
    axum_test::TestServer::new(router).expect("Failed to create test server")
}

/// Create a user with a freshly minted API key, returning the plaintext
/// secret for use in Authorization headers.
pub async fn create_test_user_with_key(pool: &PgPool, username: &str, is_admin: bool) -> (User, String) {
    let mut conn = pool.acquire().await.unwrap();

    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: None,
            is_admin,
        })
        .await
        .unwrap();

    let secret = crate::crypto::generate_api_key();
    ApiKeys::new(&mut conn)
        .create(&ApiKeyCreateDBRequest {
            user_id: user.id,
            name: "test".to_string(),
            secret: secret.clone(),
        })
        .await
        .unwrap();

    (user, secret)
}
