//! Database repository for campaigns.

use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::campaigns::{Campaign, CampaignCreateDBRequest, CampaignStatus, CampaignUpdateDBRequest};
use crate::types::{CampaignId, ClientId, abbrev_uuid};

/// Filter for listing campaigns.
#[derive(Debug, Clone, Default)]
pub struct CampaignFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<CampaignStatus>,
    /// Matches campaigns whose tags array contains this value
    pub tag: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository for campaign operations.
pub struct Campaigns<'c> {
    db: &'c mut PgConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &CampaignFilter) {
    if let Some(client_id) = filter.client_id {
        query.push(" AND client_id = ");
        query.push_bind(client_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
    if let Some(ref tag) = filter.tag {
        query.push(" AND tags @> ");
        query.push_bind(serde_json::json!([tag]));
    }
}

impl<'c> Campaigns<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count campaigns matching the filter (before pagination).
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CampaignFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM campaigns WHERE 1=1");
        push_filters(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    /// Atomically bump one of the denormalized campaign counters.
    ///
    /// `column` must be one of the fixed counter column names from
    /// [`crate::db::models::email_accounts::EmailEventType::campaign_counter_column`];
    /// it is interpolated as an identifier, so callers must never pass
    /// user-supplied strings.
    #[instrument(skip(self), fields(campaign_id = %abbrev_uuid(&id), column = column), err)]
    pub async fn increment_counter(&mut self, id: CampaignId, column: &'static str) -> Result<()> {
        let sql = format!("UPDATE campaigns SET {column} = {column} + 1, updated_at = NOW() WHERE id = $1");
        let result = sqlx::query(&sql).bind(id).execute(&mut *self.db).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Campaigns<'c> {
    type CreateRequest = CampaignCreateDBRequest;
    type UpdateRequest = CampaignUpdateDBRequest;
    type Response = Campaign;
    type Id = CampaignId;
    type Filter = CampaignFilter;

    #[instrument(skip(self, request), fields(client_id = %abbrev_uuid(&request.client_id), name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (client_id, name, status, tags, email_account_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.client_id)
        .bind(&request.name)
        .bind(request.status.as_str())
        .bind(serde_json::json!(request.tags))
        .bind(serde_json::json!(request.email_account_ids))
        .fetch_one(&mut *self.db)
        .await?;

        Ok(campaign)
    }

    #[instrument(skip(self), fields(campaign_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(campaign)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM campaigns WHERE 1=1");
        push_filters(&mut query, filter);

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let campaigns = query.build_query_as::<Campaign>().fetch_all(&mut *self.db).await?;

        Ok(campaigns)
    }

    #[instrument(skip(self), fields(campaign_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(campaign_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns
            SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                tags = COALESCE($4, tags),
                email_account_ids = COALESCE($5, email_account_ids),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.status.map(|s| s.as_str()))
        .bind(request.tags.as_ref().map(|t| serde_json::json!(t)))
        .bind(request.email_account_ids.as_ref().map(|ids| serde_json::json!(ids)))
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(campaign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Clients;
    use crate::db::models::clients::ClientCreateDBRequest;
    use sqlx::PgPool;

    async fn create_client(conn: &mut PgConnection, name: &str) -> ClientId {
        let mut repo = Clients::new(conn);
        repo.create(&ClientCreateDBRequest {
            name: name.to_string(),
            contact_email: None,
            company: None,
        })
        .await
        .unwrap()
        .id
    }

    fn campaign_request(client_id: ClientId, name: &str) -> CampaignCreateDBRequest {
        CampaignCreateDBRequest {
            client_id,
            name: name.to_string(),
            status: CampaignStatus::Draft,
            tags: vec!["outbound".to_string()],
            email_account_ids: vec![],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_campaign(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;

        let mut repo = Campaigns::new(&mut conn);
        let campaign = repo.create(&campaign_request(client_id, "Q1 outreach")).await.unwrap();

        assert_eq!(campaign.name, "Q1 outreach");
        assert_eq!(campaign.campaign_status(), CampaignStatus::Draft);
        assert_eq!(campaign.tags(), vec!["outbound".to_string()]);
        assert_eq!(campaign.sent_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_campaign_requires_client(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Campaigns::new(&mut conn);

        let err = repo
            .create(&campaign_request(uuid::Uuid::new_v4(), "orphan"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_client_delete_blocked_by_campaign(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;

        let mut repo = Campaigns::new(&mut conn);
        repo.create(&campaign_request(client_id, "active")).await.unwrap();

        let mut clients = Clients::new(&mut conn);
        let err = clients.delete(client_id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_a = create_client(&mut conn, "a").await;
        let client_b = create_client(&mut conn, "b").await;

        let mut repo = Campaigns::new(&mut conn);
        repo.create(&campaign_request(client_a, "one")).await.unwrap();
        let mut active = campaign_request(client_b, "two");
        active.status = CampaignStatus::Active;
        active.tags = vec!["priority".to_string()];
        repo.create(&active).await.unwrap();

        let filter = CampaignFilter {
            client_id: Some(client_b),
            status: Some(CampaignStatus::Active),
            tag: Some("priority".to_string()),
            limit: 10,
            offset: 0,
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "two");
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_increment_counter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;

        let mut repo = Campaigns::new(&mut conn);
        let campaign = repo.create(&campaign_request(client_id, "counting")).await.unwrap();

        repo.increment_counter(campaign.id, "sent_count").await.unwrap();
        repo.increment_counter(campaign.id, "sent_count").await.unwrap();
        repo.increment_counter(campaign.id, "open_count").await.unwrap();

        let reloaded = repo.get_by_id(campaign.id).await.unwrap().unwrap();
        assert_eq!(reloaded.sent_count, 2);
        assert_eq!(reloaded.open_count, 1);
        assert_eq!(reloaded.reply_count, 0);
    }
}
