use std::collections::HashMap;

use crate::api::models::tools::Tool;
use crate::db::errors::Result;
use crate::db::handlers::repository::Repository;
use crate::db::models::content::{ContentCreateDBRequest, ContentDBResponse};
use crate::types::{ContentId, OrgId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing content
#[derive(Debug, Clone)]
pub struct ContentFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: OrgId,
    pub tool: Option<Tool>,
}

/// Generated content is immutable once stored; there is no update path.
#[derive(Debug, Clone)]
pub struct NoUpdate;

pub struct Contents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Contents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Contents<'c> {
    type CreateRequest = ContentCreateDBRequest;
    type UpdateRequest = NoUpdate;
    type Response = ContentDBResponse;
    type Id = ContentId;
    type Filter = ContentFilter;

    #[instrument(skip(self, request), fields(tool = %request.tool, title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let content = sqlx::query_as::<_, ContentDBResponse>(
            r#"
            INSERT INTO content (organization_id, tool, title, body, provider, model, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(request.tool)
        .bind(&request.title)
        .bind(&request.body)
        .bind(request.provider)
        .bind(&request.model)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(content)
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let content = sqlx::query_as::<_, ContentDBResponse>("SELECT * FROM content WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(content)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let contents = sqlx::query_as::<_, ContentDBResponse>("SELECT * FROM content WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(contents.into_iter().map(|c| (c.id, c)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let contents = sqlx::query_as::<_, ContentDBResponse>(
            r#"
            SELECT * FROM content
            WHERE organization_id = $1
                AND ($2::tool_kind IS NULL OR tool = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.tool)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(contents)
    }

    #[instrument(skip(self), fields(content_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&mut self, _id: Self::Id, _request: &Self::UpdateRequest) -> Result<Self::Response> {
        Err(crate::db::errors::DbError::ProtectedEntity {
            operation: crate::types::Operation::UpdateOrg,
            reason: "generated content is immutable".to_string(),
            entity_type: "content".to_string(),
            entity_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::provider_keys::Provider;
    use crate::db::handlers::Organizations;
    use crate::db::models::organizations::OrganizationCreateDBRequest;
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_org(pool: &PgPool, name: &str) -> OrgId {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);
        repo.create(&OrganizationCreateDBRequest {
            name: name.to_string(),
            created_by: None,
        })
        .await
        .unwrap()
        .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_list_delete_content(pool: PgPool) {
        let org = create_org(&pool, "Content Org").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Contents::new(&mut conn);

        let created = repo
            .create(&ContentCreateDBRequest {
                organization_id: org,
                tool: Tool::Thread,
                title: "Launch thread".to_string(),
                body: json!({"threads": ["post one", "post two"]}),
                provider: Provider::Anthropic,
                model: "test-model".to_string(),
                created_by: None,
            })
            .await
            .unwrap();

        assert_eq!(created.body["threads"][0], "post one");

        let listed = repo
            .list(&ContentFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                tool: Some(Tool::Thread),
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);

        let none = repo
            .list(&ContentFilter {
                skip: 0,
                limit: 10,
                organization_id: org,
                tool: Some(Tool::Summary),
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
