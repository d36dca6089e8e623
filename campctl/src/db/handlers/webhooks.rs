//! Database repository for webhook configuration.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::models::webhooks::{Webhook, WebhookCreateDBRequest, WebhookUpdateDBRequest};
use crate::types::{UserId, WebhookId, abbrev_uuid};

/// Repository for webhook operations.
pub struct Webhooks<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Webhooks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &WebhookCreateDBRequest) -> Result<Webhook> {
        let webhook = sqlx::query_as::<_, Webhook>(
            r#"
            INSERT INTO webhooks (user_id, url, secret, event_types, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.url)
        .bind(&request.secret)
        .bind(request.event_types.as_ref().map(|t| serde_json::json!(t)))
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(webhook)
    }

    #[instrument(skip(self), fields(webhook_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: WebhookId) -> Result<Option<Webhook>> {
        let webhook = sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(webhook)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_by_user(&mut self, user_id: UserId) -> Result<Vec<Webhook>> {
        let webhooks = sqlx::query_as::<_, Webhook>(
            "SELECT * FROM webhooks WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(webhooks)
    }

    #[instrument(skip(self, request), fields(webhook_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: WebhookId, request: &WebhookUpdateDBRequest) -> Result<Webhook> {
        let webhook = sqlx::query_as::<_, Webhook>(
            r#"
            UPDATE webhooks
            SET
                url = COALESCE($2, url),
                enabled = COALESCE($3, enabled),
                event_types = CASE WHEN $4::boolean THEN $5 ELSE event_types END,
                description = CASE WHEN $6::boolean THEN $7 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.url)
        .bind(request.enabled)
        .bind(request.event_types.is_some())
        .bind(
            request
                .event_types
                .clone()
                .flatten()
                .map(|t| serde_json::json!(t)),
        )
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(webhook)
    }

    #[instrument(skip(self), fields(webhook_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: WebhookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the signing secret, returning the updated row.
    #[instrument(skip(self, secret), fields(webhook_id = %abbrev_uuid(&id)), err)]
    pub async fn rotate_secret(&mut self, id: WebhookId, secret: &str) -> Result<Webhook> {
        let webhook = sqlx::query_as::<_, Webhook>(
            "UPDATE webhooks SET secret = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(secret)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(webhook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Users;
    use crate::db::handlers::repository::Repository;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    async fn create_user(conn: &mut PgConnection, username: &str) -> UserId {
        let mut repo = Users::new(conn);
        repo.create(&UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            display_name: None,
            is_admin: false,
        })
        .await
        .unwrap()
        .id
    }

    fn create_request(user_id: UserId) -> WebhookCreateDBRequest {
        WebhookCreateDBRequest {
            user_id,
            url: "https://example.com/hook".to_string(),
            secret: "whsec_original".to_string(),
            event_types: Some(vec!["campaign.completed".to_string()]),
            description: Some("deploy hook".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_list(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "alice").await;

        let mut repo = Webhooks::new(&mut conn);
        let created = repo.create(&create_request(user_id)).await.unwrap();
        assert!(created.enabled);
        assert_eq!(created.url, "https://example.com/hook");

        let listed = repo.list_by_user(user_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_clears_event_filter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "bob").await;

        let mut repo = Webhooks::new(&mut conn);
        let created = repo.create(&create_request(user_id)).await.unwrap();
        assert!(created.event_types.is_some());

        let updated = repo
            .update(
                created.id,
                &WebhookUpdateDBRequest {
                    enabled: Some(false),
                    event_types: Some(None), // back to "all events"
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.enabled);
        assert!(updated.event_types.is_none());
        assert_eq!(updated.description, created.description);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rotate_secret(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_user(&mut conn, "carol").await;

        let mut repo = Webhooks::new(&mut conn);
        let created = repo.create(&create_request(user_id)).await.unwrap();

        let rotated = repo.rotate_secret(created.id, "whsec_rotated").await.unwrap();
        assert_eq!(rotated.secret, "whsec_rotated");
        assert_ne!(rotated.secret, created.secret);

        let missing = repo.rotate_secret(uuid::Uuid::new_v4(), "whsec_x").await.unwrap_err();
        assert!(matches!(missing, DbError::NotFound));
    }
}
