//! Database models for per-tool generation settings (prompts).

use crate::api::models::tools::Tool;
use crate::types::{OrgId, ToolSettingsId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ToolSettingsUpsertDBRequest {
    pub organization_id: OrgId,
    pub tool: Tool,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ToolSettingsDBResponse {
    pub id: ToolSettingsId,
    /// None for the platform default row
    pub organization_id: Option<OrgId>,
    pub tool: Tool,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
    pub updated_at: DateTime<Utc>,
}
