//! OpenAPI documentation for the management API.
//!
//! Served as JSON at `/api-docs/openapi.json` with an interactive viewer at
//! `/admin/docs`.

use utoipa::OpenApi;

use crate::{
    analytics,
    api::handlers,
    api::models::{analytics as analytics_params, auth, content, logs, organizations, pagination, provider_keys, tools, users, wordpress},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pressroom Management API",
        description = "Multi-tenant content-operations backend: organizations, AI content tools, WordPress publishing, and usage analytics."
    ),
    paths(
        // Authentication
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::auth::accept_invitation,
        // Users
        handlers::users::get_current_profile,
        handlers::users::list_profiles,
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::users::delete_profile,
        handlers::users::invite_user,
        // Organizations
        handlers::organizations::create_organization,
        handlers::organizations::list_organizations,
        handlers::organizations::get_organization,
        handlers::organizations::update_organization,
        handlers::organizations::delete_organization,
        // Provider keys
        handlers::provider_keys::create_provider_key,
        handlers::provider_keys::list_provider_keys,
        handlers::provider_keys::update_provider_key,
        handlers::provider_keys::delete_provider_key,
        // Tool settings
        handlers::tool_settings::list_tool_settings,
        handlers::tool_settings::upsert_tool_settings,
        handlers::tool_settings::delete_tool_settings,
        // Tools
        handlers::tools::generate_newsletter,
        handlers::tools::generate_thread,
        handlers::tools::generate_lie_detector,
        handlers::tools::generate_summary,
        // Content
        handlers::content::list_content,
        handlers::content::get_content,
        handlers::content::delete_content,
        // Analytics + logs
        handlers::analytics::get_analytics,
        handlers::logs::list_logs,
        // WordPress
        handlers::wordpress::test_connection,
        handlers::wordpress::save_credentials,
        handlers::wordpress::list_integrations,
        handlers::wordpress::oauth_authorize_url,
        handlers::wordpress::oauth_exchange,
        handlers::wordpress::delete_integration,
    ),
    components(schemas(
        auth::LoginRequest,
        auth::AuthResponse,
        auth::AuthSuccessResponse,
        auth::ChangePasswordRequest,
        auth::AcceptInvitationRequest,
        users::Role,
        users::CurrentUser,
        users::ProfileResponse,
        users::ProfileUpdate,
        users::InviteUserRequest,
        users::InvitationResponse,
        organizations::OrganizationCreate,
        organizations::OrganizationUpdate,
        organizations::OrganizationResponse,
        handlers::organizations::OrganizationCreatedResponse,
        provider_keys::Provider,
        provider_keys::ProviderKeyCreate,
        provider_keys::ProviderKeyUpdate,
        provider_keys::ProviderKeyResponse,
        tools::Tool,
        tools::LogStatus,
        tools::ModelSelection,
        tools::NewsletterRequest,
        tools::ThreadRequest,
        tools::LieDetectorRequest,
        tools::SummaryRequest,
        tools::ToolSettingsResponse,
        tools::ToolSettingsUpdate,
        tools::NewsletterDraft,
        tools::NewsletterSection,
        tools::ThreadDraft,
        tools::FactCheckReport,
        tools::ClaimAssessment,
        tools::SummaryResult,
        content::ContentResponse,
        logs::LogEntryResponse,
        analytics_params::AnalyticsQuery,
        analytics::AnalyticsSummary,
        analytics::ToolUsage,
        analytics::DailyActivity,
        analytics::ProviderUsage,
        analytics::DailyEngagement,
        analytics::ErrorSummary,
        analytics::UserActivity,
        wordpress::WpConnectionType,
        wordpress::WordPressCredentials,
        wordpress::WordPressTestResponse,
        wordpress::IntegrationResponse,
        wordpress::OAuthAuthorizeResponse,
        wordpress::OAuthExchangeRequest,
        pagination::Pagination,
    )),
    tags(
        (name = "authentication", description = "Login, logout, passwords, invitations"),
        (name = "users", description = "Profile management"),
        (name = "organizations", description = "Tenant management"),
        (name = "provider_keys", description = "AI provider API keys"),
        (name = "tool_settings", description = "Per-tool prompts and sampling settings"),
        (name = "tools", description = "AI content generation"),
        (name = "content", description = "Generated content"),
        (name = "analytics", description = "Usage analytics"),
        (name = "logs", description = "Activity log"),
        (name = "wordpress", description = "WordPress integration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("OpenAPI document should serialize");
        assert!(json.contains("/tools/newsletter"));
        assert!(json.contains("/analytics"));
        assert!(json.contains("AnalyticsSummary"));
    }
}
