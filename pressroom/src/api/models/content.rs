//! API response models for generated content.

use super::pagination::Pagination;
use crate::api::models::{provider_keys::Provider, tools::Tool};
use crate::db::models::content::ContentDBResponse;
use crate::types::{ContentId, OrgId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContentId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub tool: Tool,
    pub title: String,
    /// The structured generation result, shape depends on `tool`
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
    pub provider: Provider,
    pub model: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ContentDBResponse> for ContentResponse {
    fn from(db: ContentDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            tool: db.tool,
            title: db.title,
            body: db.body,
            provider: db.provider,
            model: db.model,
            created_by: db.created_by,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListContentQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Restrict to one tool
    pub tool: Option<Tool>,
}
