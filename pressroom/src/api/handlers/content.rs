use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        content::{ContentResponse, ListContentQuery},
        users::CurrentUser,
    },
    auth::permissions,
    db::handlers::{Contents, Repository, content::ContentFilter},
    errors::{Error, Result},
    types::{ContentId, Operation, Permission, Resource},
};

/// List the caller's organization's generated content, newest first
#[utoipa::path(
    get,
    path = "/content",
    tag = "content",
    params(ListContentQuery),
    responses(
        (status = 200, description = "Content items", body = [ContentResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ListContentQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<ContentResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Contents::new(&mut pool_conn);

    let contents = repo
        .list(&ContentFilter {
            skip: query.pagination.skip(),
            limit: query.pagination.limit(),
            organization_id: current_user.organization_id,
            tool: query.tool,
        })
        .await?;

    Ok(Json(contents.into_iter().map(ContentResponse::from).collect()))
}

/// Get one content item
#[utoipa::path(
    get,
    path = "/content/{id}",
    tag = "content",
    params(("id" = uuid::Uuid, Path, description = "Content ID")),
    responses(
        (status = 200, description = "Content item", body = ContentResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<ContentId>,
    current_user: CurrentUser,
) -> Result<Json<ContentResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Contents::new(&mut pool_conn);

    let content = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Content".to_string(),
        id: id.to_string(),
    })?;

    if !permissions::can_read_org(&current_user, content.organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Content, Operation::ReadOrg),
            action: Operation::ReadOrg,
            resource: format!("content {id}"),
        });
    }

    Ok(Json(ContentResponse::from(content)))
}

/// Delete a content item (its creator, or an organization manager)
#[utoipa::path(
    delete,
    path = "/content/{id}",
    tag = "content",
    params(("id" = uuid::Uuid, Path, description = "Content ID")),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not found"),
    )
)]
pub async fn delete_content(State(state): State<AppState>, Path(id): Path<ContentId>, current_user: CurrentUser) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Contents::new(&mut pool_conn);

    let content = repo.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Content".to_string(),
        id: id.to_string(),
    })?;

    let is_creator = content.created_by == Some(current_user.id) && content.organization_id == current_user.organization_id;
    if !is_creator && !permissions::can_manage_org(&current_user, content.organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Content, Operation::DeleteOrg),
            action: Operation::DeleteOrg,
            resource: format!("content {id}"),
        });
    }

    repo.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
