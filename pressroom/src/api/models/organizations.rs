//! API request/response models for organizations.

use super::pagination::Pagination;
use crate::db::models::organizations::OrganizationDBResponse;
use crate::types::OrgId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationCreate {
    pub name: String,
    /// Email of the organization's initial OWNER; a passwordless profile plus an
    /// invitation is created for it.
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrgId,
    pub name: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrganizationDBResponse> for OrganizationResponse {
    fn from(db: OrganizationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListOrganizationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}
