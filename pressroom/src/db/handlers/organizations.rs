use std::collections::HashMap;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, OrganizationUpdateDBRequest};
use crate::types::{OrgId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing organizations
#[derive(Debug, Clone)]
pub struct OrganizationFilter {
    pub skip: i64,
    pub limit: i64,
}

pub struct Organizations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Organizations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Get an organization by its unique name
    #[instrument(skip(self), err)]
    pub async fn get_by_name(&mut self, name: &str) -> Result<Option<OrganizationDBResponse>> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(org)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Organizations<'c> {
    type CreateRequest = OrganizationCreateDBRequest;
    type UpdateRequest = OrganizationUpdateDBRequest;
    type Response = OrganizationDBResponse;
    type Id = OrgId;
    type Filter = OrganizationFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>(
            r#"
            INSERT INTO organizations (name, created_by)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(org)
    }

    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(org)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let orgs = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(orgs.into_iter().map(|o| (o.id, o)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let orgs = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations ORDER BY created_at DESC LIMIT $1 OFFSET $2")
            .bind(filter.limit)
            .bind(filter.skip)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(orgs)
    }

    /// Delete an organization. Dependent rows (members, keys, content, log
    /// entries, integrations, settings) go with it via FK cascade; callers run
    /// this inside a transaction.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(org_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>(
            r#"
            UPDATE organizations
            SET
                name = COALESCE($2, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_organization(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let created = repo
            .create(&OrganizationCreateDBRequest {
                name: "Acme Media".to_string(),
                created_by: None,
            })
            .await
            .unwrap();

        assert_eq!(created.name, "Acme Media");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        let by_name = repo.get_by_name("Acme Media").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let request = OrganizationCreateDBRequest {
            name: "Duplicated".to_string(),
            created_by: None,
        };
        repo.create(&request).await.unwrap();

        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete_organization(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let created = repo
            .create(&OrganizationCreateDBRequest {
                name: "Old Name".to_string(),
                created_by: None,
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                &OrganizationUpdateDBRequest {
                    name: Some("New Name".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "New Name");

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        // Second delete is a no-op
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
