use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        pagination::Pagination,
        provider_keys::{ProviderKeyCreate, ProviderKeyResponse, ProviderKeyUpdate},
        users::CurrentUser,
    },
    auth::permissions,
    crypto,
    db::handlers::{ProviderKeys, Repository, provider_keys::ProviderKeyFilter},
    db::models::provider_keys::{ProviderKeyCreateDBRequest, ProviderKeyUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, OrgId, Permission, ProviderKeyId, Resource},
};

fn require_read(current_user: &CurrentUser, org_id: OrgId) -> Result<()> {
    if !permissions::can_read_org(current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::ProviderKeys, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("provider keys of organization {org_id}"),
        });
    }
    Ok(())
}

fn require_manage(current_user: &CurrentUser, org_id: OrgId) -> Result<()> {
    if !permissions::can_manage_org(current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::ProviderKeys, Operation::UpdateOrg),
            action: Operation::UpdateOrg,
            resource: format!("provider keys of organization {org_id}"),
        });
    }
    Ok(())
}

/// Store a provider API key for an organization.
///
/// The plaintext secret is encrypted before it reaches the database and is
/// never returned by any endpoint.
#[utoipa::path(
    post,
    path = "/organizations/{org_id}/provider-keys",
    request_body = ProviderKeyCreate,
    tag = "provider_keys",
    params(("org_id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 201, description = "Key stored", body = ProviderKeyResponse),
        (status = 400, description = "Empty secret"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "An active key for this provider already exists"),
    )
)]
pub async fn create_provider_key(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    current_user: CurrentUser,
    Json(request): Json<ProviderKeyCreate>,
) -> Result<(StatusCode, Json<ProviderKeyResponse>)> {
    require_manage(&current_user, org_id)?;

    if request.secret.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Provider key secret cannot be empty".to_string(),
        });
    }

    let encrypted = crypto::encrypt_with_env_key(request.secret.as_bytes()).map_err(|e| Error::Internal {
        operation: format!("encrypt provider key: {e}"),
    })?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProviderKeys::new(&mut pool_conn);

    let key = repo
        .create(&ProviderKeyCreateDBRequest {
            organization_id: org_id,
            provider: request.provider,
            secret: encrypted,
            models: request.models.clone(),
            created_by: Some(current_user.id),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ProviderKeyResponse::from(key))))
}

/// List an organization's provider keys (secrets omitted)
#[utoipa::path(
    get,
    path = "/organizations/{org_id}/provider-keys",
    tag = "provider_keys",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        Pagination,
    ),
    responses(
        (status = 200, description = "List of keys", body = [ProviderKeyResponse]),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn list_provider_keys(
    State(state): State<AppState>,
    Path(org_id): Path<OrgId>,
    Query(pagination): Query<Pagination>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ProviderKeyResponse>>> {
    require_read(&current_user, org_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProviderKeys::new(&mut pool_conn);

    let keys = repo
        .list(&ProviderKeyFilter {
            skip: pagination.skip(),
            limit: pagination.limit(),
            organization_id: Some(org_id),
        })
        .await?;

    Ok(Json(keys.into_iter().map(ProviderKeyResponse::from).collect()))
}

/// Update a provider key (activate/deactivate, models list)
#[utoipa::path(
    patch,
    path = "/organizations/{org_id}/provider-keys/{id}",
    request_body = ProviderKeyUpdate,
    tag = "provider_keys",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        ("id" = uuid::Uuid, Path, description = "Key ID"),
    ),
    responses(
        (status = 200, description = "Updated key", body = ProviderKeyResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Another key for this provider is already active"),
    )
)]
pub async fn update_provider_key(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(OrgId, ProviderKeyId)>,
    current_user: CurrentUser,
    Json(update): Json<ProviderKeyUpdate>,
) -> Result<Json<ProviderKeyResponse>> {
    require_manage(&current_user, org_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProviderKeys::new(&mut pool_conn);

    // Scope check before touching the row
    let existing = repo
        .get_by_id(id)
        .await?
        .filter(|key| key.organization_id == org_id)
        .ok_or_else(|| Error::NotFound {
            resource: "Provider key".to_string(),
            id: id.to_string(),
        })?;

    let key = repo
        .update(
            existing.id,
            &ProviderKeyUpdateDBRequest {
                active: update.active,
                models: update.models.clone(),
            },
        )
        .await?;

    Ok(Json(ProviderKeyResponse::from(key)))
}

/// Delete a provider key
#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/provider-keys/{id}",
    tag = "provider_keys",
    params(
        ("org_id" = uuid::Uuid, Path, description = "Organization ID"),
        ("id" = uuid::Uuid, Path, description = "Key ID"),
    ),
    responses(
        (status = 204, description = "Key deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete_provider_key(
    State(state): State<AppState>,
    Path((org_id, id)): Path<(OrgId, ProviderKeyId)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    require_manage(&current_user, org_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ProviderKeys::new(&mut pool_conn);

    let existing = repo
        .get_by_id(id)
        .await?
        .filter(|key| key.organization_id == org_id)
        .ok_or_else(|| Error::NotFound {
            resource: "Provider key".to_string(),
            id: id.to_string(),
        })?;

    repo.delete(existing.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
