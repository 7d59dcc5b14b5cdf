//! Database models for generated content.

use crate::api::models::{provider_keys::Provider, tools::Tool};
use crate::types::{ContentId, OrgId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ContentCreateDBRequest {
    pub organization_id: OrgId,
    pub tool: Tool,
    pub title: String,
    pub body: serde_json::Value,
    pub provider: Provider,
    pub model: String,
    pub created_by: Option<ProfileId>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContentDBResponse {
    pub id: ContentId,
    pub organization_id: OrgId,
    pub tool: Tool,
    pub title: String,
    pub body: serde_json::Value,
    pub provider: Provider,
    pub model: String,
    pub created_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
}
