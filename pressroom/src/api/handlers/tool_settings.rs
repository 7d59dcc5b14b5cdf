use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        tools::{Tool, ToolSettingsResponse, ToolSettingsUpdate},
        users::CurrentUser,
    },
    auth::permissions,
    db::handlers::ToolSettings,
    db::models::tool_settings::ToolSettingsUpsertDBRequest,
    errors::{Error, Result},
    types::{Operation, OrgId, Permission, Resource},
};

fn require_manage(current_user: &CurrentUser, org_id: OrgId) -> Result<()> {
    if !permissions::can_manage_org(current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::ToolSettings, Operation::UpdateOrg),
            action: Operation::UpdateOrg,
            resource: format!("tool settings of organization {org_id}"),
        });
    }
    Ok(())
}

/// Effective settings for every tool (org overrides where present)
#[utoipa::path(
    get,
    path = "/organizations/{org_id}/tool-settings",
    tag = "tool_settings",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Effective settings per tool", body = [ToolSettingsResponse]),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn list_tool_settings(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ToolSettingsResponse>>> {
    if !permissions::can_read_org(&current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::ToolSettings, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("tool settings of organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = ToolSettings::new(&mut pool_conn).list_effective(org_id).await?;

    Ok(Json(settings.into_iter().map(ToolSettingsResponse::from).collect()))
}

/// Override one tool's settings for an organization
#[utoipa::path(
    put,
    path = "/organizations/{org_id}/tool-settings/{tool}",
    request_body = ToolSettingsUpdate,
    tag = "tool_settings",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        ("tool" = Tool, Path, description = "Tool to override"),
    ),
    responses(
        (status = 200, description = "Stored settings", body = ToolSettingsResponse),
        (status = 400, description = "Invalid settings"),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn upsert_tool_settings(
    State(state): State<AppState>,
    Path((org_id, tool)): Path<(OrgId, Tool)>,
    current_user: CurrentUser,
    Json(update): Json<ToolSettingsUpdate>,
) -> Result<Json<ToolSettingsResponse>> {
    require_manage(&current_user, org_id)?;

    if update.system_prompt.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "System prompt cannot be empty".to_string(),
        });
    }
    if !(0.0..=2.0).contains(&update.temperature) {
        return Err(Error::BadRequest {
            message: "Temperature must be between 0.0 and 2.0".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&update.top_p) {
        return Err(Error::BadRequest {
            message: "top_p must be between 0.0 and 1.0".to_string(),
        });
    }
    if update.max_tokens <= 0 {
        return Err(Error::BadRequest {
            message: "max_tokens must be positive".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let settings = ToolSettings::new(&mut pool_conn)
        .upsert(&ToolSettingsUpsertDBRequest {
            organization_id: org_id,
            tool,
            system_prompt: update.system_prompt.clone(),
            temperature: update.temperature,
            top_p: update.top_p,
            max_tokens: update.max_tokens,
        })
        .await?;

    Ok(Json(ToolSettingsResponse::from(settings)))
}

/// Drop an organization's override, reverting the tool to the platform default
#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/tool-settings/{tool}",
    tag = "tool_settings",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        ("tool" = Tool, Path, description = "Tool whose override to drop"),
    ),
    responses(
        (status = 204, description = "Override removed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No override exists"),
    )
)]
pub async fn delete_tool_settings(
    State(state): State<AppState>,
    Path((org_id, tool)): Path<(OrgId, Tool)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_manage(&current_user, org_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if !ToolSettings::new(&mut pool_conn).delete_override(org_id, tool).await? {
        return Err(Error::NotFound {
            resource: "Tool settings override".to_string(),
            id: format!("{org_id}/{tool}"),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
