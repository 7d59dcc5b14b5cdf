//! Analytics endpoint: fetch a window of the caller's activity log and
//! aggregate it in memory.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Duration, Utc};

use crate::{
    AppState,
    analytics::{self, AnalyticsSummary},
    api::models::{analytics::AnalyticsQuery, users::CurrentUser},
    db::handlers::ActivityLog,
    errors::{Error, Result},
};

/// Days covered when the query gives no explicit window
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Usage summary for the caller's organization.
///
/// The window is inclusive: `from` starts at 00:00:00 UTC and `to` runs
/// through the whole day. With no rows in the window, every section of the
/// summary is empty and the dashboard renders its "no data" state.
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "analytics",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Aggregated usage summary", body = AnalyticsSummary),
        (status = 400, description = "Invalid date range"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
    current_user: CurrentUser,
) -> Result<Json<AnalyticsSummary>> {
    let today = Utc::now().date_naive();
    let to = query.to.unwrap_or(today);
    let from = query.from.unwrap_or_else(|| to - Duration::days(DEFAULT_WINDOW_DAYS - 1));

    if from > to {
        return Err(Error::BadRequest {
            message: "Invalid date range: 'from' is after 'to'".to_string(),
        });
    }

    let (start, end) = analytics::day_window(from, to);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = ActivityLog::new(&mut pool_conn)
        .fetch_window(current_user.organization_id, start, end, query.tool)
        .await?;

    Ok(Json(analytics::summarize(&rows)))
}
