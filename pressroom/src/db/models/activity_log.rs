//! Database models for the activity log.

use crate::api::models::{
    provider_keys::Provider,
    tools::{LogStatus, Tool},
};
use crate::types::{LogEntryId, OrgId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LogEntryCreateDBRequest {
    pub organization_id: OrgId,
    pub tool: Tool,
    pub status: LogStatus,
    pub duration_ms: Option<i64>,
    pub tokens_used: Option<i64>,
    pub provider: Option<Provider>,
    pub user_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LogEntryDBResponse {
    pub id: LogEntryId,
    pub organization_id: OrgId,
    pub created_at: DateTime<Utc>,
    pub tool: Tool,
    pub status: LogStatus,
    pub duration_ms: Option<i64>,
    pub tokens_used: Option<i64>,
    pub provider: Option<Provider>,
    pub user_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}
