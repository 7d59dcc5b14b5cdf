//! Repository for WordPress integrations.

use crate::api::models::wordpress::WpConnectionType;
use crate::db::errors::Result;
use crate::db::models::wordpress::{IntegrationCreateDBRequest, IntegrationDBResponse};
use crate::types::{IntegrationId, OrgId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct WordPressIntegrations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> WordPressIntegrations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Store a new active integration, deactivating any previous active row of
    /// the same connection type. Callers run this on a transaction connection
    /// so the swap is atomic.
    #[instrument(skip(self, request), fields(org_id = %abbrev_uuid(&request.organization_id)), err)]
    pub async fn replace_active(&mut self, request: &IntegrationCreateDBRequest) -> Result<IntegrationDBResponse> {
        sqlx::query(
            r#"
            UPDATE wordpress_integrations
            SET active = FALSE, updated_at = NOW()
            WHERE organization_id = $1 AND connection_type = $2 AND active
            "#,
        )
        .bind(request.organization_id)
        .bind(request.connection_type)
        .execute(&mut *self.db)
        .await?;

        let integration = sqlx::query_as::<_, IntegrationDBResponse>(
            r#"
            INSERT INTO wordpress_integrations (organization_id, connection_type, site_url, username, secret)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(request.connection_type)
        .bind(&request.site_url)
        .bind(&request.username)
        .bind(&request.secret)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(integration)
    }

    /// The active integration for an organization and connection type, if any
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id)), err)]
    pub async fn get_active(&mut self, org_id: OrgId, connection_type: WpConnectionType) -> Result<Option<IntegrationDBResponse>> {
        let integration = sqlx::query_as::<_, IntegrationDBResponse>(
            "SELECT * FROM wordpress_integrations WHERE organization_id = $1 AND connection_type = $2 AND active",
        )
        .bind(org_id)
        .bind(connection_type)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(integration)
    }

    /// All integrations (active and inactive) for an organization
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id)), err)]
    pub async fn list(&mut self, org_id: OrgId) -> Result<Vec<IntegrationDBResponse>> {
        let integrations =
            sqlx::query_as::<_, IntegrationDBResponse>("SELECT * FROM wordpress_integrations WHERE organization_id = $1 ORDER BY created_at DESC")
                .bind(org_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(integrations)
    }

    #[instrument(skip(self), fields(integration_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: IntegrationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wordpress_integrations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{Organizations, Repository};
    use crate::db::models::organizations::OrganizationCreateDBRequest;
    use sqlx::PgPool;

    async fn create_org(pool: &PgPool, name: &str) -> OrgId {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);
        repo.create(&OrganizationCreateDBRequest {
            name: name.to_string(),
            created_by: None,
        })
        .await
        .unwrap()
        .id
    }

    fn integration_request(org: OrgId, site: &str) -> IntegrationCreateDBRequest {
        IntegrationCreateDBRequest {
            organization_id: org,
            connection_type: WpConnectionType::SelfHosted,
            site_url: site.to_string(),
            username: Some("editor".to_string()),
            secret: "encrypted-app-password".to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_replace_active_swaps_atomically(pool: PgPool) {
        let org = create_org(&pool, "WP Org").await;

        let mut tx = pool.begin().await.unwrap();
        let mut repo = WordPressIntegrations::new(&mut tx);
        let first = repo.replace_active(&integration_request(org, "https://old.example.com")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let mut repo = WordPressIntegrations::new(&mut tx);
        let second = repo.replace_active(&integration_request(org, "https://new.example.com")).await.unwrap();
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = WordPressIntegrations::new(&mut conn);

        let active = repo.get_active(org, WpConnectionType::SelfHosted).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(active.site_url, "https://new.example.com");

        // Old row still exists, but inactive
        let all = repo.list(org).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|i| i.id == first.id && !i.active));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_connection_types_are_independent(pool: PgPool) {
        let org = create_org(&pool, "WP Types Org").await;

        let mut tx = pool.begin().await.unwrap();
        let mut repo = WordPressIntegrations::new(&mut tx);
        repo.replace_active(&integration_request(org, "https://self.example.com")).await.unwrap();
        repo.replace_active(&IntegrationCreateDBRequest {
            organization_id: org,
            connection_type: WpConnectionType::WordpressCom,
            site_url: "https://blog.wordpress.com".to_string(),
            username: None,
            secret: "encrypted-oauth-token".to_string(),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = WordPressIntegrations::new(&mut conn);

        assert!(repo.get_active(org, WpConnectionType::SelfHosted).await.unwrap().is_some());
        assert!(repo.get_active(org, WpConnectionType::WordpressCom).await.unwrap().is_some());
    }
}
