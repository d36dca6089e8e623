//! Database repository for API keys.
//!
//! Keys do not use the base repository trait; they are create/list/delete
//! only and are always scoped to their owning user.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::api_keys::{ApiKey, ApiKeyAuthRow, ApiKeyCreateDBRequest};
use crate::types::{ApiKeyId, UserId, abbrev_uuid};

/// Repository for API key operations.
pub struct ApiKeys<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ApiKeys<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), name = %request.name), err)]
    pub async fn create(&mut self, request: &ApiKeyCreateDBRequest) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (user_id, name, secret)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.secret)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(key)
    }

    #[instrument(skip(self), fields(key_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: ApiKeyId) -> Result<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(key)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_by_user(&mut self, user_id: UserId) -> Result<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(keys)
    }

    #[instrument(skip(self), fields(key_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: ApiKeyId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Resolve a bearer secret to its owning user. The secret is never
    /// logged.
    #[instrument(skip_all, err)]
    pub async fn find_by_secret(&mut self, secret: &str) -> Result<Option<ApiKeyAuthRow>> {
        let row = sqlx::query_as::<_, ApiKeyAuthRow>(
            r#"
            SELECT u.id AS user_id, u.username, u.email, u.display_name, u.is_admin
            FROM api_keys k
            JOIN users u ON u.id = k.user_id
            WHERE k.secret = $1
            "#,
        )
        .bind(secret)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row)
    }
}
