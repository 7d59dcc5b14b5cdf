use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::users::{CurrentUser, InvitationResponse, InviteUserRequest, ListProfilesQuery, ProfileResponse, ProfileUpdate, Role},
    auth::{password, permissions},
    crypto,
    db::handlers::{Invitations, Organizations, Profiles, Repository, profiles::ProfileFilter},
    db::models::{invitations::InvitationCreateDBRequest, profiles::{ProfileCreateDBRequest, ProfileUpdateDBRequest}},
    errors::{Error, Result},
    types::{Operation, OrgId, Permission, ProfileId, Resource},
};

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The caller's profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn get_current_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let profile = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// List profiles in an organization
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(ListProfilesQuery),
    responses(
        (status = 200, description = "List of profiles", body = [ProfileResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    )
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ListProfilesQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ProfileResponse>>> {
    // Default to the caller's organization; only platform admins may look elsewhere
    let org_id = query.organization_id.unwrap_or(current_user.organization_id);
    if !permissions::can_read_org(&current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("profiles of organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let profiles = repo
        .list(&ProfileFilter {
            skip: query.pagination.skip(),
            limit: query.pagination.limit(),
            organization_id: Some(org_id),
            search: query.search.clone(),
        })
        .await?;

    Ok(Json(profiles.into_iter().map(ProfileResponse::from).collect()))
}

/// Get a profile by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<ProfileId>,
    current_user: CurrentUser,
) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let profile = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: id.to_string(),
    })?;

    if !permissions::can_read_org(&current_user, profile.organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("profile {id}"),
        });
    }

    Ok(Json(ProfileResponse::from(profile)))
}

/// Update a profile (display name, role)
#[utoipa::path(
    patch,
    path = "/users/{id}",
    request_body = ProfileUpdate,
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<ProfileId>,
    current_user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut pool_conn);

    let profile = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: id.to_string(),
    })?;

    // Users may edit their own display name; role changes need managing rights
    let changing_own_name = id == current_user.id && update.role.is_none();
    if !changing_own_name && !permissions::can_manage_profile(&current_user, profile.organization_id, &profile.role) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::UpdateOrg),
            action: Operation::UpdateOrg,
            resource: format!("profile {id}"),
        });
    }

    // Demoting the last owner would lock the organization out
    if let Some(new_role) = &update.role {
        if profile.role == Role::Owner && *new_role != Role::Owner && repo.count_owners(profile.organization_id).await? <= 1 {
            return Err(Error::Conflict {
                message: "Cannot demote the last owner of an organization".to_string(),
            });
        }
    }

    let updated = repo
        .update(
            id,
            &ProfileUpdateDBRequest {
                display_name: update.display_name.clone(),
                role: update.role.clone(),
            },
        )
        .await?;

    Ok(Json(ProfileResponse::from(updated)))
}

/// Delete a profile
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "Profile ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Cannot delete the last owner"),
    )
)]
pub async fn delete_profile(State(state): State<AppState>, Path(id): Path<ProfileId>, current_user: CurrentUser) -> Result<StatusCode> {
    if id == current_user.id {
        return Err(Error::BadRequest {
            message: "You cannot delete your own account".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Profiles::new(&mut tx);

    let profile = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: id.to_string(),
    })?;

    if !permissions::can_manage_profile(&current_user, profile.organization_id, &profile.role) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::DeleteOrg),
            action: Operation::DeleteOrg,
            resource: format!("profile {id}"),
        });
    }

    if profile.role == Role::Owner && repo.count_owners(profile.organization_id).await? <= 1 {
        return Err(Error::Conflict {
            message: "Cannot delete the last owner of an organization".to_string(),
        });
    }

    repo.delete(id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Invite a user into an organization.
///
/// Creates a passwordless profile plus a single-use invitation token and
/// emails the accept link. If the email fails after the profile is committed,
/// the profile stays and the failure is reported in the response - the
/// invitation can be re-sent.
#[utoipa::path(
    post,
    path = "/users/invitations",
    request_body = InviteUserRequest,
    tag = "users",
    responses(
        (status = 201, description = "Invitation created", body = InvitationResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already in use"),
    )
)]
pub async fn invite_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<InviteUserRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>)> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }

    let org_id = request.organization_id.unwrap_or(current_user.organization_id);
    if !permissions::can_manage_org(&current_user, org_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::CreateOrg),
            action: Operation::CreateOrg,
            resource: format!("profiles of organization {org_id}"),
        });
    }

    let role = request.role.clone().unwrap_or(Role::User);
    // Granting OWNER through an invite is owner/platform-admin territory
    if role == Role::Owner && !permissions::can_manage_profile(&current_user, org_id, &Role::Owner) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Profiles, Operation::CreateOrg),
            action: Operation::CreateOrg,
            resource: "an OWNER profile".to_string(),
        });
    }

    let org_name = {
        let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut org_repo = Organizations::new(&mut pool_conn);
        org_repo
            .get_by_id(org_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Organization".to_string(),
                id: org_id.to_string(),
            })?
            .name
    };

    let invitation = create_invited_profile(&state, org_id, &org_name, &request.email, request.display_name.clone(), role).await?;

    Ok((StatusCode::CREATED, Json(invitation)))
}

/// Shared invite flow: profile + invitation token in one transaction, email
/// afterwards. Used by user invitations and by organization creation (for the
/// initial owner).
pub(crate) async fn create_invited_profile(
    state: &AppState,
    org_id: OrgId,
    org_name: &str,
    email: &str,
    display_name: Option<String>,
    role: Role,
) -> Result<InvitationResponse> {
    let token = crypto::generate_token();
    let token_for_hash = token.clone();
    let token_hash = tokio::task::spawn_blocking(move || password::hash_string(&token_for_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn token hashing task: {e}"),
        })??;

    let expires_at = Utc::now() + state.config.invitations.expiry;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let profile = Profiles::new(&mut tx)
        .create(&ProfileCreateDBRequest {
            organization_id: org_id,
            email: email.trim().to_lowercase(),
            display_name: display_name.clone(),
            role,
            is_admin: false,
            auth_source: "invitation".to_string(),
            password_hash: None,
        })
        .await?;

    let invitation = Invitations::new(&mut tx)
        .create(&InvitationCreateDBRequest {
            profile_id: profile.id,
            token_hash,
            expires_at,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Email after commit; a send failure leaves the profile in place and is
    // surfaced in the response for manual follow-up
    let email_sent = match state
        .email
        .send_invitation_email(&profile.email, display_name.as_deref(), org_name, &invitation.id, &token)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Invitation created but email failed for {}: {e}", profile.email);
            false
        }
    };

    Ok(InvitationResponse {
        invitation_id: invitation.id,
        profile: ProfileResponse::from(profile),
        expires_at,
        email_sent,
    })
}
