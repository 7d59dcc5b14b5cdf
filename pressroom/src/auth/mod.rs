//! Authentication and authorization system.
//!
//! # Authentication
//!
//! Browser clients authenticate with email/password at `/authentication/login` and
//! receive a JWT session token in a secure, HTTP-only cookie. Programmatic clients
//! may instead send the same token as `Authorization: Bearer <token>`. The
//! [`current_user`] extractor tries both in that order.
//!
//! # Authorization
//!
//! Every profile belongs to exactly one organization and carries a role within it
//! (`OWNER`, `ADMIN`, or `USER`). A separate platform `is_admin` flag marks
//! operators who may act across organizations (e.g. creating new tenants).
//! [`permissions`] holds the checking logic used by handlers.
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Permission checking and access control logic
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
