//! Database models for WordPress integrations.

use crate::api::models::wordpress::WpConnectionType;
use crate::types::{IntegrationId, OrgId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct IntegrationCreateDBRequest {
    pub organization_id: OrgId,
    pub connection_type: WpConnectionType,
    pub site_url: String,
    pub username: Option<String>,
    /// Already encrypted app password or OAuth token
    pub secret: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct IntegrationDBResponse {
    pub id: IntegrationId,
    pub organization_id: OrgId,
    pub connection_type: WpConnectionType,
    pub site_url: String,
    pub username: Option<String>,
    pub secret: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
