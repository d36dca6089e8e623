//! Database repository for clients (tenant organizations).

use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::clients::{Client, ClientCreateDBRequest, ClientUpdateDBRequest};
use crate::types::{ClientId, abbrev_uuid};

/// Filter for listing clients.
#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    /// Case-insensitive substring match over name and company
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository for client operations.
pub struct Clients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Clients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Count clients matching the filter (before pagination).
    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &ClientFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM clients WHERE 1=1");
        push_search(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}

fn push_search(query: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &ClientFilter) {
    if let Some(ref search) = filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        query.push(" AND (LOWER(name) LIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR LOWER(COALESCE(company, '')) LIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Clients<'c> {
    type CreateRequest = ClientCreateDBRequest;
    type UpdateRequest = ClientUpdateDBRequest;
    type Response = Client;
    type Id = ClientId;
    type Filter = ClientFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, contact_email, company)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.contact_email)
        .bind(&request.company)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(client)
    }

    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(client)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, offset = filter.offset), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM clients WHERE 1=1");
        push_search(&mut query, filter);

        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let clients = query.build_query_as::<Client>().fetch_all(&mut *self.db).await?;

        Ok(clients)
    }

    #[instrument(skip(self), fields(client_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // RESTRICT foreign keys from campaigns and email_accounts surface
        // here as DbError::ForeignKeyViolation (HTTP 400 at the API layer)
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(client_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
            SET
                name = COALESCE($2, name),
                contact_email = CASE WHEN $3::boolean THEN $4 ELSE contact_email END,
                company = CASE WHEN $5::boolean THEN $6 ELSE company END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(request.contact_email.is_some())
        .bind(request.contact_email.clone().flatten())
        .bind(request.company.is_some())
        .bind(request.company.clone().flatten())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn create_request(name: &str) -> ClientCreateDBRequest {
        ClientCreateDBRequest {
            name: name.to_string(),
            contact_email: Some(format!("{name}@example.com")),
            company: Some("Acme Corp".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_fetch_client(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Clients::new(&mut conn);

        let created = repo.create(&create_request("tenant-a")).await.unwrap();
        assert_eq!(created.name, "tenant-a");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, created.name);
        assert_eq!(fetched.contact_email, created.contact_email);
        assert_eq!(fetched.company, created.company);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Clients::new(&mut conn);

        repo.create(&create_request("dup")).await.unwrap();
        let err = repo.create(&create_request("dup")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_with_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Clients::new(&mut conn);

        repo.create(&create_request("alpha")).await.unwrap();
        repo.create(&create_request("beta")).await.unwrap();

        let filter = ClientFilter {
            search: Some("ALP".to_string()),
            limit: 10,
            offset: 0,
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "alpha");
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_clears_nullable_field(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Clients::new(&mut conn);

        let created = repo.create(&create_request("gamma")).await.unwrap();

        let update = ClientUpdateDBRequest {
            name: None,
            contact_email: Some(None), // explicit clear
            company: None,             // untouched
        };
        let updated = repo.update(created.id, &update).await.unwrap();
        assert_eq!(updated.name, "gamma");
        assert_eq!(updated.contact_email, None);
        assert_eq!(updated.company, created.company);
    }
}
