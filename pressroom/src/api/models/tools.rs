//! API request/response models for the AI content tools.
//!
//! Each tool asks its provider for a fixed JSON shape; the structs in the
//! second half of this module are those shapes, parsed strictly from the
//! provider's structured output.

use crate::api::models::provider_keys::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// One AI-assisted content feature
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "tool_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Newsletter,
    Thread,
    LieDetector,
    Summary,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Newsletter => write!(f, "newsletter"),
            Tool::Thread => write!(f, "thread"),
            Tool::LieDetector => write!(f, "lie_detector"),
            Tool::Summary => write!(f, "summary"),
        }
    }
}

/// Outcome of a tool invocation, as recorded in the activity log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "log_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Completed,
    Failed,
}

/// Provider + model selection shared by all tool requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelSelection {
    pub provider: Provider,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsletterRequest {
    #[serde(flatten)]
    pub selection: ModelSelection,
    /// What the newsletter issue is about
    pub topic: String,
    /// Who it is written for
    pub audience: Option<String>,
    /// Source material, bullet points, links
    pub notes: Option<String>,
    /// Client-generated session identifier, used to group tool invocations in analytics
    #[schema(value_type = Option<String>, format = "uuid")]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadRequest {
    #[serde(flatten)]
    pub selection: ModelSelection,
    /// The content to turn into a thread
    pub content: String,
    /// How many posts to aim for
    pub post_count: Option<u32>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LieDetectorRequest {
    #[serde(flatten)]
    pub selection: ModelSelection,
    /// The content whose factual claims should be checked
    pub content: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryRequest {
    #[serde(flatten)]
    pub selection: ModelSelection,
    /// The content to summarize
    pub content: String,
    /// Target length hint, e.g. "one paragraph"
    pub length: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub session_id: Option<Uuid>,
}

/// Per-tool generation settings as exposed by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolSettingsResponse {
    pub tool: Tool,
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
    /// False when the organization is using the platform default
    pub customized: bool,
}

impl From<crate::db::models::tool_settings::ToolSettingsDBResponse> for ToolSettingsResponse {
    fn from(db: crate::db::models::tool_settings::ToolSettingsDBResponse) -> Self {
        Self {
            tool: db.tool,
            system_prompt: db.system_prompt,
            temperature: db.temperature,
            top_p: db.top_p,
            max_tokens: db.max_tokens,
            customized: db.organization_id.is_some(),
        }
    }
}

/// Request to override a tool's settings for an organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolSettingsUpdate {
    pub system_prompt: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: i32,
}

// --- Structured generation results ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NewsletterSection {
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct NewsletterDraft {
    pub subject: String,
    pub sections: Vec<NewsletterSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ThreadDraft {
    pub threads: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ClaimAssessment {
    pub claim: String,
    /// e.g. "accurate", "misleading", "false", "unverifiable"
    pub assessment: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct FactCheckReport {
    pub verdict: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub claims: Vec<ClaimAssessment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SummaryResult {
    pub summary: String,
    pub key_points: Vec<String>,
}
