//! Database models for organizations.

use crate::types::OrgId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub name: String,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct OrganizationUpdateDBRequest {
    pub name: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct OrganizationDBResponse {
    pub id: OrgId,
    pub name: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
