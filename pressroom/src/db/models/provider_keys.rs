//! Database models for AI provider API keys.

use crate::api::models::provider_keys::Provider;
use crate::types::{OrgId, ProfileId, ProviderKeyId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ProviderKeyCreateDBRequest {
    pub organization_id: OrgId,
    pub provider: Provider,
    /// Already encrypted; the plaintext never reaches the repository
    pub secret: String,
    pub models: Vec<String>,
    pub created_by: Option<ProfileId>,
}

#[derive(Debug, Clone)]
pub struct ProviderKeyUpdateDBRequest {
    pub active: Option<bool>,
    pub models: Option<Vec<String>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProviderKeyDBResponse {
    pub id: ProviderKeyId,
    pub organization_id: OrgId,
    pub provider: Provider,
    pub secret: String,
    pub active: bool,
    pub models: Vec<String>,
    pub created_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
