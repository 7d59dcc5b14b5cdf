//! API models for WordPress integrations.

use crate::db::models::wordpress::IntegrationDBResponse;
use crate::types::{IntegrationId, OrgId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How an organization is connected to WordPress
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "wp_connection_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WpConnectionType {
    SelfHosted,
    WordpressCom,
}

/// Credentials for a self-hosted site using an application password.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WordPressCredentials {
    pub site_url: String,
    pub username: String,
    pub app_password: String,
}

/// Result of probing a WordPress site, nothing is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WordPressTestResponse {
    pub site_name: Option<String>,
    pub description: Option<String>,
    pub post_count: i64,
}

/// Stored integration, secret omitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntegrationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: IntegrationId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub connection_type: WpConnectionType,
    pub site_url: String,
    pub username: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<IntegrationDBResponse> for IntegrationResponse {
    fn from(db: IntegrationDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            connection_type: db.connection_type,
            site_url: db.site_url,
            username: db.username,
            active: db.active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OAuthAuthorizeResponse {
    pub authorize_url: String,
    /// Opaque state value the client must return unchanged in the exchange step
    pub state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OAuthExchangeRequest {
    pub code: String,
    pub state: String,
}
