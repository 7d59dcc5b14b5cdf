use std::collections::HashMap;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest};
use crate::types::{OrgId, ProfileId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing profiles
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrgId>,
    pub search: Option<String>,
}

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a profile by email (unique across the platform)
    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    /// Store a new password hash for a profile
    #[instrument(skip(self, password_hash), fields(profile_id = %abbrev_uuid(&id)), err)]
    pub async fn set_password(&mut self, id: ProfileId, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE profiles SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful login
    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    pub async fn touch_last_login(&mut self, id: ProfileId) -> Result<()> {
        sqlx::query("UPDATE profiles SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    /// Count profiles holding the OWNER role in an organization.
    ///
    /// Used to refuse deleting the last owner.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id)), err)]
    pub async fn count_owners(&mut self, org_id: OrgId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE organization_id = $1 AND role = 'OWNER'")
            .bind(org_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(count)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Profiles<'c> {
    type CreateRequest = ProfileCreateDBRequest;
    type UpdateRequest = ProfileUpdateDBRequest;
    type Response = ProfileDBResponse;
    type Id = ProfileId;
    type Filter = ProfileFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            INSERT INTO profiles (organization_id, email, display_name, role, is_admin, auth_source, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(&request.role)
        .bind(request.is_admin)
        .bind(&request.auth_source)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(profile)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let profiles = sqlx::query_as::<_, ProfileDBResponse>("SELECT * FROM profiles WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let search_pattern = filter.search.as_ref().map(|s| format!("%{s}%"));

        let profiles = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            SELECT * FROM profiles
            WHERE
                ($1::uuid IS NULL OR organization_id = $1)
                AND ($2::text IS NULL OR email ILIKE $2 OR display_name ILIKE $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.organization_id)
        .bind(search_pattern)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(profiles)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(
            r#"
            UPDATE profiles
            SET
                display_name = COALESCE($2, display_name),
                role = COALESCE($3, role),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(&request.role)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }
}
