//! Repository for the activity log.
//!
//! Rows are append-only: one per tool invocation or recorded event. The
//! analytics endpoint fetches a window of rows here and hands them to
//! [`crate::analytics::summarize`].

use crate::api::models::tools::Tool;
use crate::db::errors::Result;
use crate::db::models::activity_log::{LogEntryCreateDBRequest, LogEntryDBResponse};
use crate::types::{OrgId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing log entries
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: OrgId,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub tool: Option<Tool>,
}

pub struct ActivityLog<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ActivityLog<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Append one log row
    #[instrument(skip(self, request), fields(tool = %request.tool), err)]
    pub async fn insert(&mut self, request: &LogEntryCreateDBRequest) -> Result<LogEntryDBResponse> {
        let entry = sqlx::query_as::<_, LogEntryDBResponse>(
            r#"
            INSERT INTO activity_log
                (organization_id, tool, status, duration_ms, tokens_used, provider, user_id, session_id, error_code, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(request.tool)
        .bind(request.status)
        .bind(request.duration_ms)
        .bind(request.tokens_used)
        .bind(request.provider)
        .bind(request.user_id)
        .bind(request.session_id)
        .bind(&request.error_code)
        .bind(&request.error_message)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// Fetch all rows for an organization within an inclusive time window,
    /// optionally restricted to one tool. Ordered ascending by time.
    ///
    /// This is the analytics input query: the aggregation itself happens in
    /// memory, so no LIMIT is applied here.
    #[instrument(skip(self), fields(org_id = %abbrev_uuid(&org_id)), err)]
    pub async fn fetch_window(
        &mut self,
        org_id: OrgId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        tool: Option<Tool>,
    ) -> Result<Vec<LogEntryDBResponse>> {
        let entries = sqlx::query_as::<_, LogEntryDBResponse>(
            r#"
            SELECT * FROM activity_log
            WHERE organization_id = $1
                AND created_at >= $2
                AND created_at <= $3
                AND ($4::tool_kind IS NULL OR tool = $4)
            ORDER BY created_at ASC
            "#,
        )
        .bind(org_id)
        .bind(start)
        .bind(end)
        .bind(tool)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }

    /// List log entries with filtering and pagination, newest first
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &LogFilter) -> Result<Vec<LogEntryDBResponse>> {
        let entries = sqlx::query_as::<_, LogEntryDBResponse>(
            r#"
            SELECT * FROM activity_log
            WHERE organization_id = $1
                AND ($2::timestamptz IS NULL OR created_at >= $2)
                AND ($3::timestamptz IS NULL OR created_at <= $3)
                AND ($4::tool_kind IS NULL OR tool = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.tool)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{provider_keys::Provider, tools::LogStatus};
    use crate::db::handlers::Organizations;
    use crate::db::handlers::Repository;
    use crate::db::models::organizations::OrganizationCreateDBRequest;
    use sqlx::PgPool;
    use uuid::Uuid;

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

    fn log_request(org: OrgId, tool: Tool, status: LogStatus) -> LogEntryCreateDBRequest {
        LogEntryCreateDBRequest {
            organization_id: org,
            tool,
            status,
            duration_ms: Some(1200),
            tokens_used: Some(300),
            provider: Some(Provider::OpenAi),
            user_id: Some(Uuid::new_v4()),
            session_id: Some(Uuid::new_v4()),
            error_code: None,
            error_message: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_insert_and_fetch_window(pool: PgPool) {
        let org = create_org(&pool, "Log Org").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityLog::new(&mut conn);

        repo.insert(&log_request(org, Tool::Newsletter, LogStatus::Completed)).await.unwrap();
        repo.insert(&log_request(org, Tool::Thread, LogStatus::Failed)).await.unwrap();

        let now = Utc::now();
        let window = repo
            .fetch_window(org, now - chrono::Duration::hours(1), now + chrono::Duration::hours(1), None)
            .await
            .unwrap();
        assert_eq!(window.len(), 2);

        let newsletters_only = repo
            .fetch_window(
                org,
                now - chrono::Duration::hours(1),
                now + chrono::Duration::hours(1),
                Some(Tool::Newsletter),
            )
            .await
            .unwrap();
        assert_eq!(newsletters_only.len(), 1);
        assert_eq!(newsletters_only[0].tool, Tool::Newsletter);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_window_excludes_other_orgs(pool: PgPool) {
        let org_a = create_org(&pool, "Log Tenant A").await;
        let org_b = create_org(&pool, "Log Tenant B").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityLog::new(&mut conn);

        repo.insert(&log_request(org_a, Tool::Summary, LogStatus::Completed)).await.unwrap();
        repo.insert(&log_request(org_b, Tool::Summary, LogStatus::Completed)).await.unwrap();

        let now = Utc::now();
        let window = repo
            .fetch_window(org_a, now - chrono::Duration::hours(1), now + chrono::Duration::hours(1), None)
            .await
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].organization_id, org_a);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_pagination_newest_first(pool: PgPool) {
        let org = create_org(&pool, "Paged Log Org").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityLog::new(&mut conn);

        for _ in 0..5 {
            repo.insert(&log_request(org, Tool::LieDetector, LogStatus::Completed)).await.unwrap();
        }

        let page = repo
            .list(&LogFilter {
                skip: 0,
                limit: 3,
                organization_id: org,
                from: None,
                to: None,
                tool: None,
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 3);

        let rest = repo
            .list(&LogFilter {
                skip: 3,
                limit: 3,
                organization_id: org,
                from: None,
                to: None,
                tool: None,
            })
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);
    }
}
