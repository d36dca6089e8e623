//! Cross-table statistics queries.

use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::models::clients::ClientRollup;
use crate::types::{ClientId, abbrev_uuid};

/// Read-only statistics queries spanning multiple tables.
pub struct Stats<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Stats<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Aggregate campaign counters and entity counts for one client.
    ///
    /// Sums come from the denormalized campaign counters, so they reflect
    /// all time rather than a window.
    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&client_id)), err)]
    pub async fn client_rollup(&mut self, client_id: ClientId) -> Result<ClientRollup> {
        let rollup = sqlx::query_as::<_, ClientRollup>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM campaigns WHERE client_id = $1) AS campaign_count,
                (SELECT COUNT(*) FROM email_accounts WHERE client_id = $1) AS email_account_count,
                COALESCE((SELECT SUM(sent_count) FROM campaigns WHERE client_id = $1), 0)::bigint AS sent_count,
                COALESCE((SELECT SUM(open_count) FROM campaigns WHERE client_id = $1), 0)::bigint AS open_count,
                COALESCE((SELECT SUM(reply_count) FROM campaigns WHERE client_id = $1), 0)::bigint AS reply_count,
                COALESCE((SELECT SUM(bounce_count) FROM campaigns WHERE client_id = $1), 0)::bigint AS bounce_count
            "#,
        )
        .bind(client_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(rollup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::repository::Repository;
    use crate::db::handlers::{Campaigns, Clients, EmailAccounts};
    use crate::db::models::campaigns::{CampaignCreateDBRequest, CampaignStatus};
    use crate::db::models::clients::ClientCreateDBRequest;
    use crate::db::models::email_accounts::EmailAccountCreateDBRequest;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_client_rollup(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();

        let client = Clients::new(&mut conn)
            .create(&ClientCreateDBRequest {
                name: "tenant".to_string(),
                contact_email: None,
                company: None,
            })
            .await
            .unwrap();

        let mut campaigns = Campaigns::new(&mut conn);
        for name in ["one", "two"] {
            let campaign = campaigns
                .create(&CampaignCreateDBRequest {
                    client_id: client.id,
                    name: name.to_string(),
                    status: CampaignStatus::Active,
                    tags: vec![],
                    email_account_ids: vec![],
                })
                .await
                .unwrap();
            campaigns.increment_counter(campaign.id, "sent_count").await.unwrap();
        }

        EmailAccounts::new(&mut conn)
            .create(&EmailAccountCreateDBRequest {
                client_id: client.id,
                address: "sender@example.com".to_string(),
                display_name: None,
                provider: None,
                daily_limit: 50,
                warmup_enabled: false,
            })
            .await
            .unwrap();

        let rollup = Stats::new(&mut conn).client_rollup(client.id).await.unwrap();
        assert_eq!(rollup.campaign_count, 2);
        assert_eq!(rollup.email_account_count, 1);
        assert_eq!(rollup.sent_count, 2);
        assert_eq!(rollup.open_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_client_rollup_empty_client(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();

        let client = Clients::new(&mut conn)
            .create(&ClientCreateDBRequest {
                name: "empty".to_string(),
                contact_email: None,
                company: None,
            })
            .await
            .unwrap();

        let rollup = Stats::new(&mut conn).client_rollup(client.id).await.unwrap();
        assert_eq!(rollup.campaign_count, 0);
        assert_eq!(rollup.sent_count, 0);
    }
}
