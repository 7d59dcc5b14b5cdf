//! Database models for invitation tokens.

use crate::types::{InvitationId, ProfileId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct InvitationCreateDBRequest {
    pub profile_id: ProfileId,
    /// Argon2 hash of the emailed token; the plaintext is never stored
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvitationDBResponse {
    pub id: InvitationId,
    pub profile_id: ProfileId,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
