use std::collections::HashMap;

use crate::api::models::provider_keys::Provider;
use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::provider_keys::{ProviderKeyCreateDBRequest, ProviderKeyDBResponse, ProviderKeyUpdateDBRequest};
use crate::types::{OrgId, ProviderKeyId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing provider keys
#[derive(Debug, Clone)]
pub struct ProviderKeyFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrgId>,
}

pub struct ProviderKeys<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ProviderKeys<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Find the single active key for an organization/provider pair.
    ///
    /// The partial unique index guarantees at most one row matches.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id), provider = %provider), err)]
    pub async fn find_active(&mut self, org_id: OrgId, provider: Provider) -> Result<Option<ProviderKeyDBResponse>> {
        let key = sqlx::query_as::<_, ProviderKeyDBResponse>(
            "SELECT * FROM provider_api_keys WHERE organization_id = $1 AND provider = $2 AND active",
        )
        .bind(org_id)
        .bind(provider)
        .fetch_optional(&mut *self.db)
        .await?;
        Ok(key)
    }

    /// Whether any key (active or not) exists for this organization/provider.
    ///
    /// Lets callers distinguish "never configured" from "configured but
    /// deactivated" when no active key is found.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id), provider = %provider), err)]
    pub async fn exists_for_provider(&mut self, org_id: OrgId, provider: Provider) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM provider_api_keys WHERE organization_id = $1 AND provider = $2)")
            .bind(org_id)
            .bind(provider)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for ProviderKeys<'c> {
    type CreateRequest = ProviderKeyCreateDBRequest;
    type UpdateRequest = ProviderKeyUpdateDBRequest;
    type Response = ProviderKeyDBResponse;
    type Id = ProviderKeyId;
    type Filter = ProviderKeyFilter;

    #[instrument(skip(self, request), fields(provider = %request.provider), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let key = sqlx::query_as::<_, ProviderKeyDBResponse>(
            r#"
            INSERT INTO provider_api_keys (organization_id, provider, secret, models, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(request.provider)
        .bind(&request.secret)
        .bind(&request.models)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(key)
    }

    #[instrument(skip(self), fields(key_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let key = sqlx::query_as::<_, ProviderKeyDBResponse>("SELECT * FROM provider_api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(key)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let keys = sqlx::query_as::<_, ProviderKeyDBResponse>("SELECT * FROM provider_api_keys WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(keys.into_iter().map(|k| (k.id, k)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let keys = sqlx::query_as::<_, ProviderKeyDBResponse>(
            r#"
            SELECT * FROM provider_api_keys
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(keys)
    }

    #[instrument(skip(self), fields(key_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM provider_api_keys WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(key_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let key = sqlx::query_as::<_, ProviderKeyDBResponse>(
            r#"
            UPDATE provider_api_keys
            SET
                active = COALESCE($2, active),
                models = COALESCE($3, models),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.active)
        .bind(&request.models)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(key)
    }
}
