//! Handlers for the four AI content tools.
//!
//! Each endpoint runs one generation for the caller's organization and
//! returns the stored content. The heavy lifting lives in
//! [`crate::ai::tools`].

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    ai::tools,
    api::models::{
        content::ContentResponse,
        tools::{LieDetectorRequest, NewsletterRequest, SummaryRequest, ThreadRequest},
        users::CurrentUser,
    },
    errors::Result,
};

/// Generate a newsletter draft
#[utoipa::path(
    post,
    path = "/tools/newsletter",
    request_body = NewsletterRequest,
    tag = "tools",
    responses(
        (status = 201, description = "Newsletter generated and stored", body = ContentResponse),
        (status = 400, description = "Invalid form input or provider key problem"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Provider call failed"),
    )
)]
pub async fn generate_newsletter(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<NewsletterRequest>,
) -> Result<(StatusCode, Json<ContentResponse>)> {
    let content = tools::run_newsletter(&state, &current_user, request).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// Generate a social-media thread
#[utoipa::path(
    post,
    path = "/tools/thread",
    request_body = ThreadRequest,
    tag = "tools",
    responses(
        (status = 201, description = "Thread generated and stored", body = ContentResponse),
        (status = 400, description = "Invalid form input or provider key problem"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Provider call failed"),
    )
)]
pub async fn generate_thread(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ThreadRequest>,
) -> Result<(StatusCode, Json<ContentResponse>)> {
    let content = tools::run_thread(&state, &current_user, request).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// Fact-check the claims in a piece of content
#[utoipa::path(
    post,
    path = "/tools/lie-detector",
    request_body = LieDetectorRequest,
    tag = "tools",
    responses(
        (status = 201, description = "Fact-check report generated and stored", body = ContentResponse),
        (status = 400, description = "Invalid form input or provider key problem"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Provider call failed"),
    )
)]
pub async fn generate_lie_detector(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<LieDetectorRequest>,
) -> Result<(StatusCode, Json<ContentResponse>)> {
    let content = tools::run_lie_detector(&state, &current_user, request).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// Summarize a piece of content
#[utoipa::path(
    post,
    path = "/tools/summary",
    request_body = SummaryRequest,
    tag = "tools",
    responses(
        (status = 201, description = "Summary generated and stored", body = ContentResponse),
        (status = 400, description = "Invalid form input or provider key problem"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Provider call failed"),
    )
)]
pub async fn generate_summary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<SummaryRequest>,
) -> Result<(StatusCode, Json<ContentResponse>)> {
    let content = tools::run_summary(&state, &current_user, request).await?;
    Ok((StatusCode::CREATED, Json(content)))
}
