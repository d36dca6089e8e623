//! Database repository for email accounts and their event stream.
//!
//! Listing joins `email_events` so every row carries sent/bounce/warmup
//! aggregates, optionally restricted to a time range. Event recording runs in
//! a transaction so the campaign counter bump and the event insert commit
//! together.

use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::campaigns::Campaigns;
use crate::db::handlers::repository::Repository;
use crate::db::models::email_accounts::{
    EmailAccount, EmailAccountCreateDBRequest, EmailAccountFilter, EmailAccountStatsRow,
    EmailAccountUpdateDBRequest, EmailEventCreateDBRequest, WarmupStats,
};
use crate::types::{EmailAccountId, abbrev_uuid};

/// Repository for email account operations.
pub struct EmailAccounts<'c> {
    db: &'c mut PgConnection,
}

fn push_account_filters(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &EmailAccountFilter) {
    if let Some(client_id) = filter.client_id {
        query.push(" AND a.client_id = ");
        query.push_bind(client_id);
    }
    if let Some(warmup_enabled) = filter.warmup_enabled {
        query.push(" AND a.warmup_enabled = ");
        query.push_bind(warmup_enabled);
    }
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(a.address) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(a.display_name, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

impl<'c> EmailAccounts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count accounts matching the filter (before pagination).
    ///
    /// The time range only scopes aggregates, not which accounts exist, so
    /// the count ignores `from`/`to`.
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &EmailAccountFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM email_accounts a WHERE 1=1");
        push_account_filters(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    /// List accounts with event aggregates, sorted and paginated.
    ///
    /// Accounts with no events in range still appear, with zero counts. The
    /// range conditions live on the join so the LEFT JOIN stays outer.
    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    pub async fn list_with_stats(&mut self, filter: &EmailAccountFilter) -> Result<Vec<EmailAccountStatsRow>> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT
                a.*,
                COUNT(*) FILTER (WHERE e.event_type = 'sent') AS sent_count,
                COUNT(*) FILTER (WHERE e.event_type = 'bounce') AS bounce_count,
                COUNT(*) FILTER (WHERE e.event_type = 'warmup_sent') AS warmup_sent,
                COUNT(*) FILTER (WHERE e.event_type = 'warmup_reply') AS warmup_replies,
                COUNT(*) FILTER (WHERE e.event_type = 'warmup_spam_save') AS warmup_spam_saved
            FROM email_accounts a
            LEFT JOIN email_events e ON e.account_id = a.id
            "#,
        );
        if let Some(from) = filter.from {
            query.push(" AND e.occurred_at >= ");
            query.push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND e.occurred_at < ");
            query.push_bind(to);
        }

        query.push(" WHERE 1=1");
        push_account_filters(&mut query, filter);

        query.push(" GROUP BY a.id");
        // Sort identifiers come from a fixed enum mapping, never from request
        // strings, so pushing them as raw SQL is safe
        query.push(format!(
            " ORDER BY {} {}",
            filter.sort_by.as_sql_column(),
            filter.order.as_sql()
        ));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let rows = query
            .build_query_as::<EmailAccountStatsRow>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(rows)
    }

    /// Record an email event, bumping the campaign counter in the same
    /// transaction when the event type maps to one.
    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&request.account_id), event_type = %request.event_type.as_str()), err)]
    pub async fn record_event(&mut self, request: &EmailEventCreateDBRequest) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO email_events (account_id, campaign_id, event_type, occurred_at)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            "#,
        )
        .bind(request.account_id)
        .bind(request.campaign_id)
        .bind(request.event_type.as_str())
        .bind(request.occurred_at)
        .execute(&mut *tx)
        .await?;

        if let (Some(campaign_id), Some(column)) =
            (request.campaign_id, request.event_type.campaign_counter_column())
        {
            Campaigns::new(&mut *tx).increment_counter(campaign_id, column).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch accounts by ID, used to validate campaign account links.
    #[instrument(skip_all, fields(count = ids.len()), err)]
    pub async fn list_by_ids(&mut self, ids: &[EmailAccountId]) -> Result<Vec<EmailAccount>> {
        let accounts = sqlx::query_as::<_, EmailAccount>("SELECT * FROM email_accounts WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(accounts)
    }

    /// Warmup counters for one account over an optional time range.
    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    pub async fn warmup_statistics(
        &mut self,
        id: EmailAccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<WarmupStats> {
        let stats = sqlx::query_as::<_, WarmupStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE event_type = 'warmup_sent') AS warmup_sent,
                COUNT(*) FILTER (WHERE event_type = 'warmup_reply') AS warmup_replies,
                COUNT(*) FILTER (WHERE event_type = 'warmup_spam_save') AS warmup_spam_saved
            FROM email_events
            WHERE account_id = $1
              AND ($2::timestamptz IS NULL OR occurred_at >= $2)
              AND ($3::timestamptz IS NULL OR occurred_at < $3)
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for EmailAccounts<'c> {
    type CreateRequest = EmailAccountCreateDBRequest;
    type UpdateRequest = EmailAccountUpdateDBRequest;
    type Response = EmailAccount;
    type Id = EmailAccountId;
    type Filter = EmailAccountFilter;

    #[instrument(skip(self, request), fields(address = %request.address), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let account = sqlx::query_as::<_, EmailAccount>(
            r#"
            INSERT INTO email_accounts (client_id, address, display_name, provider, daily_limit, warmup_enabled)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(request.client_id)
        .bind(&request.address)
        .bind(&request.display_name)
        .bind(&request.provider)
        .bind(request.daily_limit)
        .bind(request.warmup_enabled)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(account)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let account = sqlx::query_as::<_, EmailAccount>("SELECT * FROM email_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(account)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT a.* FROM email_accounts a WHERE 1=1");
        push_account_filters(&mut query, filter);

        query.push(" ORDER BY a.created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let accounts = query.build_query_as::<EmailAccount>().fetch_all(&mut *self.db).await?;

        Ok(accounts)
    }

    #[instrument(skip(self), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM email_accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(account_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let account = sqlx::query_as::<_, EmailAccount>(
            r#"
            UPDATE email_accounts
            SET
                display_name = CASE WHEN $2::boolean THEN $3 ELSE display_name END,
                provider = CASE WHEN $4::boolean THEN $5 ELSE provider END,
                daily_limit = COALESCE($6, daily_limit),
                warmup_enabled = COALESCE($7, warmup_enabled),
                warmup_stage = COALESCE($8, warmup_stage),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.display_name.is_some())
        .bind(request.display_name.clone().flatten())
        .bind(request.provider.is_some())
        .bind(request.provider.clone().flatten())
        .bind(request.daily_limit)
        .bind(request.warmup_enabled)
        .bind(request.warmup_stage)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Clients;
    use crate::db::models::campaigns::{Campaign, CampaignCreateDBRequest, CampaignStatus};
    use crate::db::models::clients::ClientCreateDBRequest;
    use crate::db::models::email_accounts::{EmailAccountSortKey, EmailEventType, SortOrder};
    use crate::types::ClientId;
    use chrono::Duration;
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

    async fn create_account(conn: &mut PgConnection, client_id: ClientId, address: &str) -> EmailAccount {
        let mut repo = EmailAccounts::new(conn);
        repo.create(&EmailAccountCreateDBRequest {
            client_id,
            address: address.to_string(),
            display_name: None,
            provider: Some("gmail".to_string()),
            daily_limit: 50,
            warmup_enabled: true,
        })
        .await
        .unwrap()
    }

    async fn create_campaign(conn: &mut PgConnection, client_id: ClientId) -> Campaign {
        let mut repo = Campaigns::new(conn);
        repo.create(&CampaignCreateDBRequest {
            client_id,
            name: "events".to_string(),
            status: CampaignStatus::Active,
            tags: vec![],
            email_account_ids: vec![],
        })
        .await
        .unwrap()
    }

    async fn record(
        conn: &mut PgConnection,
        account_id: EmailAccountId,
        campaign_id: Option<crate::types::CampaignId>,
        event_type: EmailEventType,
        occurred_at: Option<DateTime<Utc>>,
    ) {
        let mut repo = EmailAccounts::new(conn);
        repo.record_event(&EmailEventCreateDBRequest {
            account_id,
            campaign_id,
            event_type,
            occurred_at,
        })
        .await
        .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_address_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;

        create_account(&mut conn, client_id, "sender@example.com").await;
        let mut repo = EmailAccounts::new(&mut conn);
        let err = repo
            .create(&EmailAccountCreateDBRequest {
                client_id,
                address: "sender@example.com".to_string(),
                display_name: None,
                provider: None,
                daily_limit: 50,
                warmup_enabled: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record_event_bumps_campaign_counter(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;
        let account = create_account(&mut conn, client_id, "sender@example.com").await;
        let campaign = create_campaign(&mut conn, client_id).await;

        record(&mut conn, account.id, Some(campaign.id), EmailEventType::Sent, None).await;
        record(&mut conn, account.id, Some(campaign.id), EmailEventType::Open, None).await;
        record(&mut conn, account.id, Some(campaign.id), EmailEventType::WarmupSent, None).await;

        let mut campaigns = Campaigns::new(&mut conn);
        let reloaded = campaigns.get_by_id(campaign.id).await.unwrap().unwrap();
        assert_eq!(reloaded.sent_count, 1);
        assert_eq!(reloaded.open_count, 1);
        // warmup events never touch campaign counters
        assert_eq!(reloaded.reply_count, 0);
        assert_eq!(reloaded.bounce_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_stats_time_range(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;
        let account = create_account(&mut conn, client_id, "sender@example.com").await;

        let now = Utc::now();
        let last_week = now - Duration::days(7);
        record(&mut conn, account.id, None, EmailEventType::Sent, Some(last_week)).await;
        record(&mut conn, account.id, None, EmailEventType::Sent, Some(now)).await;
        record(&mut conn, account.id, None, EmailEventType::Bounce, Some(now)).await;

        let mut repo = EmailAccounts::new(&mut conn);

        let all = repo
            .list_with_stats(&EmailAccountFilter {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sent_count, 2);
        assert_eq!(all[0].bounce_count, 1);

        let recent = repo
            .list_with_stats(&EmailAccountFilter {
                from: Some(now - Duration::days(1)),
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(recent.len(), 1, "accounts stay listed even when range trims events");
        assert_eq!(recent[0].sent_count, 1);
        assert_eq!(recent[0].bounce_count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_stats_sorting(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;
        let quiet = create_account(&mut conn, client_id, "quiet@example.com").await;
        let busy = create_account(&mut conn, client_id, "busy@example.com").await;

        record(&mut conn, busy.id, None, EmailEventType::Sent, None).await;
        record(&mut conn, busy.id, None, EmailEventType::Sent, None).await;

        let mut repo = EmailAccounts::new(&mut conn);
        let rows = repo
            .list_with_stats(&EmailAccountFilter {
                sort_by: EmailAccountSortKey::SentCount,
                order: SortOrder::Desc,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, busy.id);
        assert_eq!(rows[1].id, quiet.id);

        let by_address = repo
            .list_with_stats(&EmailAccountFilter {
                sort_by: EmailAccountSortKey::Address,
                order: SortOrder::Asc,
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_address[0].address, "busy@example.com");
        assert_eq!(by_address[1].address, "quiet@example.com");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_warmup_statistics(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let client_id = create_client(&mut conn, "tenant").await;
        let account = create_account(&mut conn, client_id, "warm@example.com").await;

        record(&mut conn, account.id, None, EmailEventType::WarmupSent, None).await;
        record(&mut conn, account.id, None, EmailEventType::WarmupSent, None).await;
        record(&mut conn, account.id, None, EmailEventType::WarmupReply, None).await;
        record(&mut conn, account.id, None, EmailEventType::WarmupSpamSave, None).await;

        let mut repo = EmailAccounts::new(&mut conn);
        let stats = repo.warmup_statistics(account.id, None, None).await.unwrap();
        assert_eq!(stats.warmup_sent, 2);
        assert_eq!(stats.warmup_replies, 1);
        assert_eq!(stats.warmup_spam_saved, 1);

        let future = repo
            .warmup_statistics(account.id, Some(Utc::now() + Duration::days(1)), None)
            .await
            .unwrap();
        assert_eq!(future.warmup_sent, 0);
    }
}
