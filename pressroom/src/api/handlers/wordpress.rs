use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        users::CurrentUser,
        wordpress::{
            IntegrationResponse, OAuthAuthorizeResponse, OAuthExchangeRequest, WordPressCredentials, WordPressTestResponse,
            WpConnectionType,
        },
    },
    auth::permissions,
    crypto,
    db::handlers::WordPressIntegrations,
    db::models::wordpress::IntegrationCreateDBRequest,
    errors::{Error, Result},
    types::{IntegrationId, Operation, OrgId, Permission, Resource},
    wordpress::{create_oauth_state, verify_oauth_state},
};

fn require_manage(current_user: &CurrentUser, org_id: OrgId) -> Result<()> {
    if !permissions::can_manage_org(current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Integrations, Operation::UpdateOrg),
            action: Operation::UpdateOrg,
            resource: format!("WordPress integration of organization {org_id}"),
        });
    }
    Ok(())
}

/// Where WordPress.com sends the browser back after authorization
fn oauth_redirect_uri(state: &AppState) -> String {
    format!("{}/integrations/wordpress/callback", state.config.dashboard_url)
}

/// Probe a self-hosted WordPress site with the given credentials.
///
/// Nothing is persisted; this backs the "test connection" button.
#[utoipa::path(
    post,
    path = "/organizations/{org_id}/wordpress/test",
    request_body = WordPressCredentials,
    tag = "wordpress",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Site reachable", body = WordPressTestResponse),
        (status = 400, description = "Invalid site URL"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Site unreachable or rejected the credentials"),
    )
)]
pub async fn test_connection(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
    Json(credentials): Json<WordPressCredentials>,
) -> Result<Json<WordPressTestResponse>> {
    require_manage(&current_user, org_id)?;

    let result = state.wordpress.test_connection(&credentials).await?;
    Ok(Json(result))
}

/// Save self-hosted credentials as the organization's active integration.
///
/// The previous active self-hosted row (if any) is deactivated in the same
/// transaction.
#[utoipa::path(
    put,
    path = "/organizations/{org_id}/wordpress",
    request_body = WordPressCredentials,
    tag = "wordpress",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Integration stored", body = IntegrationResponse),
        (status = 400, description = "Invalid credentials"),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn save_credentials(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
    Json(credentials): Json<WordPressCredentials>,
) -> Result<Json<IntegrationResponse>> {
    require_manage(&current_user, org_id)?;

    if credentials.app_password.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Application password cannot be empty".to_string(),
        });
    }

    let encrypted = crypto::encrypt_with_env_key(credentials.app_password.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("encrypt WordPress credentials: {e}"),
    })?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let integration = WordPressIntegrations::new(&mut tx)
        .replace_active(&IntegrationCreateDBRequest {
            organization_id: org_id,
            connection_type: WpConnectionType::SelfHosted,
            site_url: credentials.site_url.trim().to_string(),
            username: Some(credentials.username.clone()),
            secret: encrypted,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(IntegrationResponse::from(integration)))
}

/// List the organization's WordPress integrations (active and historical)
#[utoipa::path(
    get,
    path = "/organizations/{org_id}/wordpress",
    tag = "wordpress",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Integrations", body = [IntegrationResponse]),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn list_integrations(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<IntegrationResponse>>> {
    if !permissions::can_read_org(&current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Integrations, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("WordPress integration of organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let integrations = WordPressIntegrations::new(&mut pool_conn).list(org_id).await?;

    Ok(Json(integrations.into_iter().map(IntegrationResponse::from).collect()))
}

/// Build the WordPress.com OAuth2 authorize URL for this organization
#[utoipa::path(
    get,
    path = "/organizations/{org_id}/wordpress/oauth/authorize-url",
    tag = "wordpress",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Authorize URL", body = OAuthAuthorizeResponse),
        (status = 400, description = "WordPress.com application not configured"),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn oauth_authorize_url(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
) -> Result<Json<OAuthAuthorizeResponse>> {
    require_manage(&current_user, org_id)?;

    let oauth_state = create_oauth_state(org_id, &state.config)?;
    let authorize_url = state.wordpress.authorize_url(&oauth_redirect_uri(&state), &oauth_state)?;

    Ok(Json(OAuthAuthorizeResponse {
        authorize_url,
        state: oauth_state,
    }))
}

/// Exchange the OAuth2 callback code for a token and store the connection
#[utoipa::path(
    post,
    path = "/organizations/{org_id}/wordpress/oauth/exchange",
    request_body = OAuthExchangeRequest,
    tag = "wordpress",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Connection stored", body = IntegrationResponse),
        (status = 400, description = "Invalid state or missing configuration"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Token exchange failed"),
    )
)]
pub async fn oauth_exchange(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
    Json(request): Json<OAuthExchangeRequest>,
) -> Result<Json<IntegrationResponse>> {
    require_manage(&current_user, org_id)?;
    verify_oauth_state(&request.state, org_id, &state.config)?;

    let token = state.wordpress.exchange_code(&request.code, &oauth_redirect_uri(&state)).await?;

    let encrypted = crypto::encrypt_with_env_key(token.access_token.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("encrypt WordPress token: {e}"),
    })?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let integration = WordPressIntegrations::new(&mut tx)
        .replace_active(&IntegrationCreateDBRequest {
            organization_id: org_id,
            connection_type: WpConnectionType::WordpressCom,
            site_url: token.blog_url.unwrap_or_else(|| "https://wordpress.com".to_string()),
            username: None,
            secret: encrypted,
        })
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(IntegrationResponse::from(integration)))
}

/// Remove an integration
#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/wordpress/{id}",
    tag = "wordpress",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        ("id" = uuid::Uuid, Path, description = "Integration ID"),
    ),
    responses(
        (status = 204, description = "Integration deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete_integration(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(OrgId, IntegrationId)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_manage(&current_user, org_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = WordPressIntegrations::new(&mut pool_conn);

    // Scope check: the row must belong to this organization
    let integrations = repo.list(org_id).await?;
    if !integrations.iter().any(|i| i.id == id) {
        return Err(Error::NotFound {
            resource: "WordPress integration".to_string(),
            id: id.to_string(),
        });
    }

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
