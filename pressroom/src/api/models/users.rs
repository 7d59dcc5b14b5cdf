//! API request/response models for profiles (users).

use super::pagination::Pagination;
use crate::db::models::profiles::ProfileDBResponse;
use crate::types::{InvitationId, OrgId, ProfileId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Role a profile holds within its organization
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(type_name = "profile_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Admin,
    User,
}

/// The authenticated caller, as resolved from the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    pub email: String,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub role: Role,
    pub is_admin: bool,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ProfileId,
    pub email: String,
    pub display_name: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub role: Role,
    pub is_admin: bool,
    pub auth_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// Whether the profile has accepted its invitation (i.e. set a password)
    pub activated: bool,
}

impl From<ProfileDBResponse> for ProfileResponse {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            display_name: db.display_name,
            organization_id: db.organization_id,
            role: db.role,
            is_admin: db.is_admin,
            auth_source: db.auth_source,
            created_at: db.created_at,
            updated_at: db.updated_at,
            last_login: db.last_login,
            activated: db.password_hash.is_some(),
        }
    }
}

impl From<ProfileDBResponse> for CurrentUser {
    fn from(db: ProfileDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            organization_id: db.organization_id,
            role: db.role,
            is_admin: db.is_admin,
            display_name: db.display_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub role: Option<Role>,
}

/// Query parameters for listing profiles
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListProfilesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on display_name or email
    pub search: Option<String>,

    /// Platform admins may list another organization's members
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub organization_id: Option<OrgId>,
}

/// Admin request to invite a user into an organization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteUserRequest {
    pub email: String,
    pub display_name: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub organization_id: Option<OrgId>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvitationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub invitation_id: InvitationId,
    pub profile: ProfileResponse,
    pub expires_at: DateTime<Utc>,
    pub email_sent: bool,
}
