//! Repository for invitation tokens.

use crate::db::errors::Result;
use crate::db::models::invitations::{InvitationCreateDBRequest, InvitationDBResponse};
use crate::types::{InvitationId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Invitations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Invitations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(profile_id = %abbrev_uuid(&request.profile_id)), err)]
    pub async fn create(&mut self, request: &InvitationCreateDBRequest) -> Result<InvitationDBResponse> {
        let invitation = sqlx::query_as::<_, InvitationDBResponse>(
            r#"
            INSERT INTO invitation_tokens (profile_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(request.profile_id)
        .bind(&request.token_hash)
        .bind(request.expires_at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(invitation)
    }

    #[instrument(skip(self), fields(invitation_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: InvitationId) -> Result<Option<InvitationDBResponse>> {
        let invitation = sqlx::query_as::<_, InvitationDBResponse>("SELECT * FROM invitation_tokens WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(invitation)
    }

    /// Mark an invitation consumed. Returns false if it was already used,
    /// making acceptance single-use even under concurrent requests.
    #[instrument(skip(self), fields(invitation_id = %abbrev_uuid(&id)), err)]
    pub async fn mark_used(&mut self, id: InvitationId) -> Result<bool> {
        let result = sqlx::query("UPDATE invitation_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
