use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState,
    analytics::day_window,
    api::models::{
        logs::{ListLogsQuery, LogEntryResponse},
        users::CurrentUser,
    },
    db::handlers::{ActivityLog, activity_log::LogFilter},
    errors::{Error, Result},
};

/// List the caller's organization's activity log, newest first
#[utoipa::path(
    get,
    path = "/logs",
    tag = "logs",
    params(ListLogsQuery),
    responses(
        (status = 200, description = "Log entries", body = [LogEntryResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<ListLogsQuery>,
    current_user: CurrentUser,
) -> Result<Json<Vec<LogEntryResponse>>> {
    // Date bounds are inclusive; `to` covers its whole day
    let from = query.from.map(|d| day_window(d, d).0);
    let to = query.to.map(|d| day_window(d, d).1);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let entries = ActivityLog::new(&mut pool_conn)
        .list(&LogFilter {
            skip: query.pagination.skip(),
            limit: query.pagination.limit(),
            organization_id: current_user.organization_id,
            from,
            to,
            tool: query.tool,
        })
        .await?;

    Ok(Json(entries.into_iter().map(LogEntryResponse::from).collect()))
}
