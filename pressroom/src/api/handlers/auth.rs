use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::{
        auth::{AcceptInvitationRequest, AuthResponse, AuthSuccessResponse, ChangePasswordRequest, LoginRequest, LoginResponse, LogoutResponse},
        users::{CurrentUser, ProfileResponse},
    },
    auth::{password, session},
    db::handlers::{Invitations, Profiles, Repository},
    errors::Error,
    types::InvitationId,
};

/// Build the session cookie string for a token
fn create_session_cookie(token: &str, config: &crate::config::Config) -> String {
    let secure = if config.auth.native.session.secure { "; Secure" } else { "" };
    format!(
        "{}={}; Path=/; HttpOnly{}; SameSite=Strict; Max-Age={}",
        config.auth.native.session.cookie_name,
        token,
        secure,
        config.auth.security.jwt_expiry.as_secs()
    )
}

/// Validate a new password against the configured length bounds
fn validate_password(password: &str, config: &crate::config::Config) -> Result<(), Error> {
    let password_config = &config.auth.native.password;
    if password.len() < password_config.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/authentication/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse, Error> {
    if !state.config.auth.native.enabled {
        return Err(Error::BadRequest {
            message: "Native authentication is disabled".to_string(),
        });
    }
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profile_repo = Profiles::new(&mut pool_conn);

    let profile = profile_repo
        .get_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    // Profiles created by invitation have no password until accepted
    let password_hash = profile.password_hash.as_ref().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let candidate = request.password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    profile_repo.touch_last_login(profile.id).await?;

    let user_response = ProfileResponse::from(profile.clone());
    let current_user = CurrentUser::from(profile);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: user_response,
            message: "Login successful".to_string(),
        },
        cookie,
    })
}

/// Logout (clear session)
#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> Result<LogoutResponse, Error> {
    // Expired cookie clears the session client-side
    let cookie = format!(
        "{}=; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=0",
        state.config.auth.native.session.cookie_name
    );

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/authentication/password-change",
    request_body = ChangePasswordRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Password changed", body = AuthSuccessResponse),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Current password incorrect"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<AuthSuccessResponse>, Error> {
    validate_password(&request.new_password, &state.config)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut profile_repo = Profiles::new(&mut pool_conn);

    let profile = profile_repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Profile".to_string(),
        id: current_user.id.to_string(),
    })?;

    let password_hash = profile.password_hash.as_ref().ok_or_else(|| Error::Unauthenticated {
        message: Some("Current password incorrect".to_string()),
    })?;

    let candidate = request.current_password.clone();
    let hash = password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password incorrect".to_string()),
        });
    }

    let new_password = request.new_password.clone();
    let new_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    profile_repo.set_password(profile.id, &new_hash).await?;

    Ok(Json(AuthSuccessResponse {
        message: "Password changed".to_string(),
    }))
}

/// Accept an invitation: verify the emailed token and set the initial password
#[utoipa::path(
    post,
    path = "/authentication/invitations/{id}/accept",
    request_body = AcceptInvitationRequest,
    tag = "authentication",
    params(
        ("id" = String, Path, description = "Invitation ID from the emailed link"),
    ),
    responses(
        (status = 200, description = "Invitation accepted", body = AuthResponse),
        (status = 400, description = "Invalid, expired, or already-used invitation"),
    )
)]
#[tracing::instrument(skip_all, fields(invitation_id = %invitation_id))]
pub async fn accept_invitation(
    State(state): State<AppState>,
    Path(invitation_id): Path<InvitationId>,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<LoginResponse, Error> {
    validate_password(&request.password, &state.config)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let invitation = Invitations::new(&mut tx)
        .get_by_id(invitation_id)
        .await?
        .ok_or_else(|| Error::BadRequest {
            message: "Invalid or expired invitation".to_string(),
        })?;

    if invitation.used_at.is_some() || invitation.expires_at < chrono::Utc::now() {
        return Err(Error::BadRequest {
            message: "Invalid or expired invitation".to_string(),
        });
    }

    // The emailed token is checked against its stored hash
    let token = request.token.clone();
    let token_hash = invitation.token_hash.clone();
    let token_valid = tokio::task::spawn_blocking(move || password::verify_string(&token, &token_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn token verification task: {e}"),
        })??;

    if !token_valid {
        return Err(Error::BadRequest {
            message: "Invalid or expired invitation".to_string(),
        });
    }

    // mark_used is conditional on unused, so a concurrent accept loses here
    if !Invitations::new(&mut tx).mark_used(invitation_id).await? {
        return Err(Error::BadRequest {
            message: "Invalid or expired invitation".to_string(),
        });
    }

    let new_password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut profile_repo = Profiles::new(&mut tx);
    profile_repo.set_password(invitation.profile_id, &password_hash).await?;
    let profile = profile_repo
        .get_by_id(invitation.profile_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Profile".to_string(),
            id: invitation.profile_id.to_string(),
        })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    // Log the user straight in
    let user_response = ProfileResponse::from(profile.clone());
    let current_user = CurrentUser::from(profile);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        auth_response: AuthResponse {
            user: user_response,
            message: "Invitation accepted".to_string(),
        },
        cookie,
    })
}
