//! API models for the activity log.

use super::pagination::Pagination;
use crate::api::models::{
    provider_keys::Provider,
    tools::{LogStatus, Tool},
};
use crate::db::models::activity_log::LogEntryDBResponse;
use crate::types::{LogEntryId, OrgId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogEntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: LogEntryId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrgId,
    pub created_at: DateTime<Utc>,
    pub tool: Tool,
    pub status: LogStatus,
    pub duration_ms: Option<i64>,
    pub tokens_used: Option<i64>,
    pub provider: Option<Provider>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub session_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl From<LogEntryDBResponse> for LogEntryResponse {
    fn from(db: LogEntryDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            created_at: db.created_at,
            tool: db.tool,
            status: db.status,
            duration_ms: db.duration_ms,
            tokens_used: db.tokens_used,
            provider: db.provider,
            user_id: db.user_id,
            session_id: db.session_id,
            error_code: db.error_code,
            error_message: db.error_message,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListLogsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Start of the date window (inclusive, from start-of-day UTC)
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// End of the date window (inclusive of the whole day, UTC)
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    /// Restrict to one tool
    pub tool: Option<Tool>,
}
