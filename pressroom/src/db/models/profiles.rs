//! Database models for profiles.

use crate::api::models::users::Role;
use crate::types::{OrgId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ProfileCreateDBRequest {
    pub organization_id: OrgId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_admin: bool,
    pub auth_source: String,
    /// None until the invitation is accepted
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdateDBRequest {
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileDBResponse {
    pub id: ProfileId,
    pub organization_id: OrgId,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_admin: bool,
    pub auth_source: String,
    pub password_hash: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
