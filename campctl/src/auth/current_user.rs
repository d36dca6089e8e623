//! Request authentication via API keys.

use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{errors::DbError, handlers::ApiKeys},
    errors::{Error, Result},
};

/// Extract a user from an API key in the Authorization header.
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid API key found and user authenticated
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, db))]
async fn try_api_key_auth(parts: &Parts, db: &PgPool) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    // Not a Bearer token, nothing to try
    let api_key = auth_str.strip_prefix("Bearer ")?;

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let row = match ApiKeys::new(&mut conn).find_by_secret(api_key).await {
        Ok(row) => row,
        Err(e) => return Some(Err(Error::Database(e))),
    };

    match row {
        Some(row) => Some(Ok(CurrentUser {
            id: row.user_id,
            username: row.username,
            email: row.email,
            display_name: row.display_name,
            is_admin: row.is_admin,
        })),
        None => Some(Err(Error::Unauthenticated {
            message: Some("Invalid API key".to_string()),
        })),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_api_key_auth(parts, &state.db).await {
            Some(Ok(user)) => {
                debug!("Found API key authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("API key authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No authentication credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_state, create_test_user_with_key};
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;

    fn parts_with_auth(value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(axum::http::header::AUTHORIZATION, value)
            .body(())
            .unwrap();
        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_valid_api_key_authenticates(pool: PgPool) {
        let state = create_test_state(pool.clone());
        let (user, secret) = create_test_user_with_key(&pool, "alice", false).await;

        let mut parts = parts_with_auth(&format!("Bearer {secret}"));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
        assert!(!current.is_admin);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_api_key_is_unauthorized(pool: PgPool) {
        let state = create_test_state(pool.clone());

        let mut parts = parts_with_auth("Bearer cmp_nonexistent");
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_header_is_unauthorized(pool: PgPool) {
        let state = create_test_state(pool.clone());

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
