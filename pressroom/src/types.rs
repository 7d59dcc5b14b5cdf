//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (OrgId, ProfileId, etc.)
//! - Permission and authorization types
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`OrgId`]: Organization (tenant) identifier
//! - [`ProfileId`]: User profile identifier
//! - [`ProviderKeyId`]: AI provider API key identifier
//! - [`ContentId`]: Generated content identifier
//! - [`LogEntryId`]: Activity log row identifier
//! - [`IntegrationId`]: WordPress integration identifier
//!
//! # Permission System
//!
//! The permission system is based on three core types:
//!
//! - [`Resource`]: What entity type is being accessed (Organizations, Profiles, ...)
//! - [`Operation`]: What action is being performed (Read, Create, Update, Delete)
//! - [`Permission`]: Authorization requirement combining resource and operation
//!
//! Operations come in two flavors: **All** (unrestricted, platform admins) and
//! **Org** (restricted to the caller's organization).

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type OrgId = Uuid;
pub type ProfileId = Uuid;
pub type ProviderKeyId = Uuid;
pub type ContentId = Uuid;
pub type LogEntryId = Uuid;
pub type IntegrationId = Uuid;
pub type ToolSettingsId = Uuid;
pub type InvitationId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Org means restricted to the caller's organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOrg,
    ReadAll,
    ReadOrg,
    UpdateOrg,
    DeleteAll,
    DeleteOrg,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Organizations,
    Profiles,
    ProviderKeys,
    Content,
    ToolSettings,
    Integrations,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOrg => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOrg => write!(f, "Read"),
            Operation::UpdateOrg => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOrg => write!(f, "Delete"),
        }
    }
}
