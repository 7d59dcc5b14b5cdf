//! Permission checking and access control logic.
//!
//! All authorization questions in the service reduce to three checks:
//!
//! - platform admins (`is_admin`) may do anything, across organizations;
//! - organization `OWNER`s and `ADMIN`s may manage resources *within their
//!   own organization*;
//! - every member may read their own organization's resources and run the
//!   content tools.
//!
//! Handlers call these helpers and translate `false` into
//! [`Error::InsufficientPermissions`](crate::errors::Error::InsufficientPermissions).

use crate::api::models::users::{CurrentUser, Role};
use crate::types::OrgId;

/// Whether the user holds a managing role (OWNER or ADMIN) in their organization.
pub fn is_org_manager(user: &CurrentUser) -> bool {
    matches!(user.role, Role::Owner | Role::Admin)
}

/// Whether the user may read resources scoped to `org_id`.
///
/// Members may read their own organization; platform admins may read any.
pub fn can_read_org(user: &CurrentUser, org_id: OrgId) -> bool {
    user.is_admin || user.organization_id == org_id
}

/// Whether the user may create/update/delete resources scoped to `org_id`.
///
/// Requires a managing role within the organization, or the platform admin flag.
pub fn can_manage_org(user: &CurrentUser, org_id: OrgId) -> bool {
    user.is_admin || (user.organization_id == org_id && is_org_manager(user))
}

/// Whether the user may create new organizations (platform admins only).
pub fn can_create_organizations(user: &CurrentUser) -> bool {
    user.is_admin
}

/// Whether the user may change another profile's role or delete it.
///
/// Managing a profile requires managing rights over its organization, and an
/// ADMIN may not touch an OWNER - only other OWNERs or platform admins can.
pub fn can_manage_profile(user: &CurrentUser, target_org: OrgId, target_role: &Role) -> bool {
    if !can_manage_org(user, target_org) {
        return false;
    }
    match target_role {
        Role::Owner => user.is_admin || user.role == Role::Owner,
        Role::Admin | Role::User => true,
    }
}
