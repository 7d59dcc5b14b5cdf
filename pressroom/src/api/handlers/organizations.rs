use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::handlers::users::create_invited_profile,
    api::models::{
        organizations::{ListOrganizationsQuery, OrganizationCreate, OrganizationResponse, OrganizationUpdate},
        users::{CurrentUser, InvitationResponse, Role},
    },
    auth::permissions,
    db::handlers::{Organizations, Repository, organizations::OrganizationFilter},
    db::models::organizations::{OrganizationCreateDBRequest, OrganizationUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, OrgId, Permission, Resource},
};
use serde::Serialize;
use utoipa::ToSchema;

/// Response for organization creation: the tenant plus the optional owner invitation
#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationCreatedResponse {
    pub organization: OrganizationResponse,
    pub owner_invitation: Option<InvitationResponse>,
}

/// Create a new organization (platform admins only)
#[utoipa::path(
    post,
    path = "/organizations",
    request_body = OrganizationCreate,
    tag = "organizations",
    responses(
        (status = 201, description = "Organization created", body = OrganizationCreatedResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Name already in use"),
    )
)]
pub async fn create_organization(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<OrganizationCreate>,
) -> Result<(StatusCode, Json<OrganizationCreatedResponse>)> {
    if !permissions::can_create_organizations(&current_user) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::CreateAll),
            action: Operation::CreateAll,
            resource: "organizations".to_string(),
        });
    }

    if request.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Organization name cannot be empty".to_string(),
        });
    }

    let organization = {
        let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = Organizations::new(&mut pool_conn);
        repo.create(&OrganizationCreateDBRequest {
            name: request.name.trim().to_string(),
            created_by: Some(current_user.id),
        })
        .await?
    };

    // Optional initial owner: profile + invitation + email. The organization
    // stays even if the invite email fails; email_sent reports it.
    let owner_invitation = if let Some(owner_email) = request.owner_email.as_deref().filter(|e| !e.trim().is_empty()) {
        Some(create_invited_profile(&state, organization.id, &organization.name, owner_email, None, Role::Owner).await?)
    } else {
        None
    };

    Ok((
        StatusCode::CREATED,
        Json(OrganizationCreatedResponse {
            organization: OrganizationResponse::from(organization),
            owner_invitation,
        }),
    ))
}

/// List organizations (platform admins only)
#[utoipa::path(
    get,
    path = "/organizations",
    tag = "organizations",
    params(ListOrganizationsQuery),
    responses(
        (status = 200, description = "List of organizations", body = [OrganizationResponse]),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<ListOrganizationsQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<OrganizationResponse>>> {
    if !current_user.is_admin {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::ReadAll),
            action: Operation::ReadAll,
            resource: "organizations".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organizations = repo
        .list(&OrganizationFilter {
            skip: query.pagination.skip(),
            limit: query.pagination.limit(),
        })
        .await?;

    Ok(Json(organizations.into_iter().map(OrganizationResponse::from).collect()))
}

/// Get an organization
#[utoipa::path(
    get,
    path = "/organizations/{id}",
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Organization", body = OrganizationResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<OrgId>,
    current_user: CurrentUser,
) -> Result<Json<OrganizationResponse>> {
    if !permissions::can_read_org(&current_user, id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("organization {id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organization = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Organization".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Rename an organization
#[utoipa::path(
    patch,
    path = "/organizations/{id}",
    request_body = OrganizationUpdate,
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 200, description = "Updated organization", body = OrganizationResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn update_organization(
    State(state): State<AppState>,
    Path(id): Path<OrgId>,
    current_user: CurrentUser,
    Json(update): Json<OrganizationUpdate>,
) -> Result<Json<OrganizationResponse>> {
    if !permissions::can_manage_org(&current_user, id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::UpdateOrg),
            action: Operation::UpdateOrg,
            resource: format!("organization {id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organization = repo
        .update(
            id,
            &OrganizationUpdateDBRequest {
                name: update.name.clone(),
            },
        )
        .await?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Delete an organization and everything it owns.
///
/// Members, provider keys, content, log entries, integrations, and settings
/// overrides all go in the same transaction (FK cascade) - no partial
/// deletions.
#[utoipa::path(
    delete,
    path = "/organizations/{id}",
    tag = "organizations",
    params(("id" = uuid::Uuid, Path, description = "Organization ID")),
    responses(
        (status = 204, description = "Organization deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete_organization(State(state): State<AppState>, Path(id): Path<OrgId>, current_user: CurrentUser) -> Result<StatusCode> {
    if !current_user.is_admin {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::DeleteAll),
            action: Operation::DeleteAll,
            resource: format!("organization {id}"),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut tx);

    if !repo.delete(id).await? {
        return Err(Error::NotFound {
            resource: "Organization".to_string(),
            id: id.to_string(),
        });
    }
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
