//! API request/response models for AI provider API keys.
//!
//! The stored secret is never returned by any endpoint; responses carry a
//! masked hint only.

use crate::db::models::provider_keys::ProviderKeyDBResponse;
use crate::types::{OrgId, ProviderKeyId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// An external AI vendor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "ai_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Anthropic => write!(f, "anthropic"),
            Provider::Google => write!(f, "google"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderKeyCreate {
    pub provider: Provider,
    /// The plaintext provider secret; encrypted before it reaches the database
    pub secret: String,
    /// Models this key is intended for (informational)
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderKeyUpdate {
    pub active: Option<bool>,
    pub models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderKeyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProviderKeyId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub provider: Provider,
    pub active: bool,
    pub models: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProviderKeyDBResponse> for ProviderKeyResponse {
    fn from(db: ProviderKeyDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            provider: db.provider,
            active: db.active,
            models: db.models,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
