//! Repository for per-tool generation settings.
//!
//! Each tool has a platform default row (NULL organization_id, seeded by
//! migration). Organizations may override it; resolution picks the org row
//! when present, the default otherwise.

use crate::api::models::tools::Tool;
use crate::db::errors::Result;
use crate::db::models::tool_settings::{ToolSettingsDBResponse, ToolSettingsUpsertDBRequest};
use crate::types::{OrgId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct ToolSettings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ToolSettings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Resolve the effective settings for one tool: the organization's
    /// override if present, otherwise the platform default.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id), tool = %tool), err)]
    pub async fn effective(&mut self, org_id: OrgId, tool: Tool) -> Result<Option<ToolSettingsDBResponse>> {
        let settings = sqlx::query_as::<_, ToolSettingsDBResponse>(
            r#"
            SELECT * FROM tool_settings
            WHERE (organization_id = $1 OR organization_id IS NULL) AND tool = $2
            ORDER BY organization_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(org_id)
        .bind(tool)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(settings)
    }

    /// Effective settings for every tool at once (org override beats default)
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id)), err)]
    pub async fn list_effective(&mut self, org_id: OrgId) -> Result<Vec<ToolSettingsDBResponse>> {
        let settings = sqlx::query_as::<_, ToolSettingsDBResponse>(
            r#"
            SELECT DISTINCT ON (tool) * FROM tool_settings
            WHERE organization_id = $1 OR organization_id IS NULL
            ORDER BY tool, organization_id NULLS LAST
            "#,
        )
        .bind(org_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(settings)
    }

    /// Create or replace an organization's override for one tool
    #[instrument(skip(self, request), fields(org_id = %abbrev_uuid(&request.organization_id), tool = %request.tool), err)]
    pub async fn upsert(&mut self, request: &ToolSettingsUpsertDBRequest) -> Result<ToolSettingsDBResponse> {
        let settings = sqlx::query_as::<_, ToolSettingsDBResponse>(
            r#"
            INSERT INTO tool_settings (organization_id, tool, system_prompt, temperature, top_p, max_tokens)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (organization_id, tool) WHERE organization_id IS NOT NULL
            DO UPDATE SET
                system_prompt = EXCLUDED.system_prompt,
                temperature = EXCLUDED.temperature,
                top_p = EXCLUDED.top_p,
                max_tokens = EXCLUDED.max_tokens,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(request.tool)
        .bind(&request.system_prompt)
        .bind(request.temperature)
        .bind(request.top_p)
        .bind(request.max_tokens)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(settings)
    }

    /// Drop an organization's override, reverting the tool to the default
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id), tool = %tool), err)]
    pub async fn delete_override(&mut self, org_id: OrgId, tool: Tool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tool_settings WHERE organization_id = $1 AND tool = $2")
            .bind(org_id)
            .bind(tool)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
