//! In-memory analytics aggregation over activity-log rows.
//!
//! [`summarize`] is a pure function from a slice of log rows to a fixed-shape
//! summary consumed directly by the dashboard's charts. It is recomputed from
//! scratch on every request: the row sets involved are small (one
//! organization, one date window), and a pure transform keeps the result a
//! deterministic function of (rows, filters) - in particular it is invariant
//! under row-order permutation.
//!
//! Missing optional fields default to zero and are excluded from averages;
//! every denominator is guarded, so an all-failures or all-empty window never
//! divides by zero.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::models::{
    provider_keys::Provider,
    tools::{LogStatus, Tool},
};
use crate::db::models::activity_log::LogEntryDBResponse;

/// Number of day-buckets kept in the daily series
const DAILY_BUCKETS: usize = 7;

/// Number of entries kept in the most-active-users ranking
const TOP_USERS: usize = 10;

/// Fixed price per 1000 tokens used for cost estimates, by provider.
///
/// These are deliberately coarse flat rates for dashboard-level estimates, not
/// billing data.
fn price_per_1k_tokens(provider: Provider) -> Decimal {
    match provider {
        Provider::OpenAi => Decimal::new(2, 3),    // 0.002
        Provider::Anthropic => Decimal::new(8, 3), // 0.008
        Provider::Google => Decimal::new(5, 4),    // 0.0005
    }
}

/// Per-tool invocation counts and outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ToolUsage {
    pub tool: Tool,
    pub count: i64,
    pub completed: i64,
    /// Integer percent in [0, 100]: round(completed * 100 / count)
    pub success_rate: u8,
    /// Mean over rows that carry a duration; None when none do
    pub avg_duration_ms: Option<f64>,
}

/// Events vs. failures for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyActivity {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub events: i64,
    pub errors: i64,
}

/// Per-provider invocation count, token usage, and estimated spend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProviderUsage {
    pub provider: Provider,
    pub invocations: i64,
    pub tokens_used: i64,
    /// tokens / 1000 x the provider's flat per-1k rate
    #[schema(value_type = String)]
    pub estimated_cost: Decimal,
}

/// Distinct users and sessions for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DailyEngagement {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub active_users: i64,
    pub active_sessions: i64,
}

/// One distinct error message with its occurrence count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorSummary {
    pub message: String,
    pub count: i64,
    pub last_seen: DateTime<Utc>,
}

/// One user ranked by distinct-session count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserActivity {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: Uuid,
    pub sessions: i64,
}

/// The chart-ready summary: fixed shape, consumed directly by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsSummary {
    pub tool_usage: Vec<ToolUsage>,
    /// Last 7 day-buckets, ascending by date
    pub daily_activity: Vec<DailyActivity>,
    pub provider_usage: Vec<ProviderUsage>,
    /// Last 7 day-buckets, ascending by date
    pub daily_engagement: Vec<DailyEngagement>,
    /// Descending by count
    pub top_errors: Vec<ErrorSummary>,
    /// Top 10 by distinct-session count
    pub top_users: Vec<UserActivity>,
}

/// Convert an inclusive calendar-date range into an inclusive UTC timestamp
/// window: start-of-day on `from` through end-of-day on `to`.
pub fn day_window(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_hms_opt(0, 0, 0).expect("midnight is always valid").and_utc();
    let end = to
        .and_hms_micro_opt(23, 59, 59, 999_999)
        .expect("end of day is always valid")
        .and_utc();
    (start, end)
}

/// Aggregate a window of log rows into the chart-ready summary.
pub fn summarize(rows: &[LogEntryDBResponse]) -> AnalyticsSummary {
    AnalyticsSummary {
        tool_usage: tool_usage(rows),
        daily_activity: daily_activity(rows),
        provider_usage: provider_usage(rows),
        daily_engagement: daily_engagement(rows),
        top_errors: top_errors(rows),
        top_users: top_users(rows),
    }
}

fn tool_usage(rows: &[LogEntryDBResponse]) -> Vec<ToolUsage> {
    struct Acc {
        count: i64,
        completed: i64,
        duration_sum: f64,
        duration_count: i64,
    }

    let mut by_tool: HashMap<Tool, Acc> = HashMap::new();
    for row in rows {
        let acc = by_tool.entry(row.tool).or_insert(Acc {
            count: 0,
            completed: 0,
            duration_sum: 0.0,
            duration_count: 0,
        });
        acc.count += 1;
        if row.status == LogStatus::Completed {
            acc.completed += 1;
        }
        if let Some(duration) = row.duration_ms {
            acc.duration_sum += duration as f64;
            acc.duration_count += 1;
        }
    }

    let mut usage: Vec<ToolUsage> = by_tool
        .into_iter()
        .map(|(tool, acc)| ToolUsage {
            tool,
            count: acc.count,
            completed: acc.completed,
            success_rate: ((acc.completed * 100) as f64 / acc.count.max(1) as f64).round() as u8,
            avg_duration_ms: (acc.duration_count > 0).then(|| acc.duration_sum / acc.duration_count as f64),
        })
        .collect();

    usage.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tool.to_string().cmp(&b.tool.to_string())));
    usage
}

fn daily_activity(rows: &[LogEntryDBResponse]) -> Vec<DailyActivity> {
    let mut by_day: HashMap<NaiveDate, (i64, i64)> = HashMap::new();
    for row in rows {
        let entry = by_day.entry(row.created_at.date_naive()).or_insert((0, 0));
        entry.0 += 1;
        if row.status == LogStatus::Failed {
            entry.1 += 1;
        }
    }

    let mut days: Vec<DailyActivity> = by_day
        .into_iter()
        .map(|(date, (events, errors))| DailyActivity { date, events, errors })
        .collect();
    days.sort_by_key(|d| d.date);

    // Keep only the most recent buckets
    if days.len() > DAILY_BUCKETS {
        days.drain(..days.len() - DAILY_BUCKETS);
    }
    days
}

fn provider_usage(rows: &[LogEntryDBResponse]) -> Vec<ProviderUsage> {
    let mut by_provider: HashMap<Provider, (i64, i64)> = HashMap::new();
    for row in rows {
        let Some(provider) = row.provider else { continue };
        let entry = by_provider.entry(provider).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += row.tokens_used.unwrap_or(0);
    }

    let mut usage: Vec<ProviderUsage> = by_provider
        .into_iter()
        .map(|(provider, (invocations, tokens))| ProviderUsage {
            provider,
            invocations,
            tokens_used: tokens,
            estimated_cost: Decimal::from(tokens) * price_per_1k_tokens(provider) / Decimal::from(1000),
        })
        .collect();

    usage.sort_by(|a, b| {
        b.invocations
            .cmp(&a.invocations)
            .then_with(|| a.provider.to_string().cmp(&b.provider.to_string()))
    });
    usage
}

fn daily_engagement(rows: &[LogEntryDBResponse]) -> Vec<DailyEngagement> {
    let mut by_day: HashMap<NaiveDate, (HashSet<Uuid>, HashSet<Uuid>)> = HashMap::new();
    for row in rows {
        let entry = by_day.entry(row.created_at.date_naive()).or_default();
        if let Some(user_id) = row.user_id {
            entry.0.insert(user_id);
        }
        if let Some(session_id) = row.session_id {
            entry.1.insert(session_id);
        }
    }

    let mut days: Vec<DailyEngagement> = by_day
        .into_iter()
        .map(|(date, (users, sessions))| DailyEngagement {
            date,
            active_users: users.len() as i64,
            active_sessions: sessions.len() as i64,
        })
        .collect();
    days.sort_by_key(|d| d.date);

    if days.len() > DAILY_BUCKETS {
        days.drain(..days.len() - DAILY_BUCKETS);
    }
    days
}

fn top_errors(rows: &[LogEntryDBResponse]) -> Vec<ErrorSummary> {
    let mut by_message: HashMap<&str, (i64, DateTime<Utc>)> = HashMap::new();
    for row in rows {
        let Some(message) = row.error_message.as_deref() else { continue };
        let entry = by_message.entry(message).or_insert((0, row.created_at));
        entry.0 += 1;
        entry.1 = entry.1.max(row.created_at);
    }

    let mut errors: Vec<ErrorSummary> = by_message
        .into_iter()
        .map(|(message, (count, last_seen))| ErrorSummary {
            message: message.to_string(),
            count,
            last_seen,
        })
        .collect();

    errors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.message.cmp(&b.message)));
    errors
}

fn top_users(rows: &[LogEntryDBResponse]) -> Vec<UserActivity> {
    let mut sessions_by_user: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
    for row in rows {
        let Some(user_id) = row.user_id else { continue };
        let sessions = sessions_by_user.entry(user_id).or_default();
        if let Some(session_id) = row.session_id {
            sessions.insert(session_id);
        }
    }

    let mut users: Vec<UserActivity> = sessions_by_user
        .into_iter()
        .map(|(user_id, sessions)| UserActivity {
            user_id,
            sessions: sessions.len() as i64,
        })
        .collect();

    users.sort_by(|a, b| b.sessions.cmp(&a.sessions).then_with(|| a.user_id.cmp(&b.user_id)));
    users.truncate(TOP_USERS);
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(tool: Tool, status: LogStatus, at: DateTime<Utc>) -> LogEntryDBResponse {
        LogEntryDBResponse {
            id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            created_at: at,
            tool,
            status,
            duration_ms: None,
            tokens_used: None,
            provider: None,
            user_id: None,
            session_id: None,
            error_code: None,
            error_message: None,
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_rows_give_empty_summary() {
        let summary = summarize(&[]);
        assert!(summary.tool_usage.is_empty());
        assert!(summary.daily_activity.is_empty());
        assert!(summary.provider_usage.is_empty());
        assert!(summary.daily_engagement.is_empty());
        assert!(summary.top_errors.is_empty());
        assert!(summary.top_users.is_empty());
    }

    #[test]
    fn test_newsletter_success_rate_example() {
        // 10 rows: 6 newsletter (5 completed), 4 summary
        let at = base_time();
        let mut rows = Vec::new();
        for i in 0..6 {
            let status = if i < 5 { LogStatus::Completed } else { LogStatus::Failed };
            rows.push(row(Tool::Newsletter, status, at));
        }
        for _ in 0..4 {
            rows.push(row(Tool::Summary, LogStatus::Completed, at));
        }

        let usage = summarize(&rows).tool_usage;
        let newsletter = usage.iter().find(|u| u.tool == Tool::Newsletter).unwrap();
        assert_eq!(newsletter.count, 6);
        assert_eq!(newsletter.completed, 5);
        assert_eq!(newsletter.success_rate, 83);
    }

    #[test]
    fn test_success_rate_bounds() {
        let at = base_time();
        let all_failed: Vec<_> = (0..3).map(|_| row(Tool::Thread, LogStatus::Failed, at)).collect();
        let usage = summarize(&all_failed).tool_usage;
        assert_eq!(usage[0].success_rate, 0);

        let all_ok: Vec<_> = (0..3).map(|_| row(Tool::Thread, LogStatus::Completed, at)).collect();
        let usage = summarize(&all_ok).tool_usage;
        assert_eq!(usage[0].success_rate, 100);
    }

    #[test]
    fn test_avg_duration_excludes_missing() {
        let at = base_time();
        let mut r1 = row(Tool::Summary, LogStatus::Completed, at);
        r1.duration_ms = Some(100);
        let mut r2 = row(Tool::Summary, LogStatus::Completed, at);
        r2.duration_ms = Some(300);
        let r3 = row(Tool::Summary, LogStatus::Completed, at); // no duration

        let usage = summarize(&[r1, r2, r3]).tool_usage;
        assert_eq!(usage[0].avg_duration_ms, Some(200.0));

        let no_durations = vec![row(Tool::Summary, LogStatus::Completed, at)];
        let usage = summarize(&no_durations).tool_usage;
        assert_eq!(usage[0].avg_duration_ms, None);
    }

    #[test]
    fn test_provider_tokens_sum_matches_rows() {
        let at = base_time();
        let mut rows = Vec::new();
        for tokens in [Some(100), Some(250), None] {
            let mut r = row(Tool::Newsletter, LogStatus::Completed, at);
            r.provider = Some(Provider::OpenAi);
            r.tokens_used = tokens;
            rows.push(r);
        }
        let mut anthropic = row(Tool::Thread, LogStatus::Completed, at);
        anthropic.provider = Some(Provider::Anthropic);
        anthropic.tokens_used = Some(1000);
        rows.push(anthropic);

        let usage = summarize(&rows).provider_usage;
        let expected: i64 = rows
            .iter()
            .filter(|r| r.provider == Some(Provider::OpenAi))
            .map(|r| r.tokens_used.unwrap_or(0))
            .sum();

        let openai = usage.iter().find(|u| u.provider == Provider::OpenAi).unwrap();
        assert_eq!(openai.tokens_used, expected);
        assert_eq!(openai.tokens_used, 350);
        assert_eq!(openai.invocations, 3);
    }

    #[test]
    fn test_cost_estimate_uses_flat_rates() {
        let at = base_time();
        let mut r = row(Tool::Newsletter, LogStatus::Completed, at);
        r.provider = Some(Provider::OpenAi);
        r.tokens_used = Some(3000);

        let usage = summarize(&[r]).provider_usage;
        // 3000 tokens at 0.002 per 1k
        assert_eq!(usage[0].estimated_cost, Decimal::new(6, 3));
    }

    #[test]
    fn test_daily_activity_keeps_last_seven_ascending() {
        let start = base_time();
        let mut rows = Vec::new();
        for day in 0..10 {
            let at = start + Duration::days(day);
            rows.push(row(Tool::Summary, LogStatus::Completed, at));
            rows.push(row(Tool::Summary, LogStatus::Failed, at));
        }

        let daily = summarize(&rows).daily_activity;
        assert_eq!(daily.len(), 7);
        // Ascending, and the oldest three days were dropped
        assert_eq!(daily[0].date, (start + Duration::days(3)).date_naive());
        assert_eq!(daily[6].date, (start + Duration::days(9)).date_naive());
        for bucket in &daily {
            assert_eq!(bucket.events, 2);
            assert_eq!(bucket.errors, 1);
        }
    }

    #[test]
    fn test_daily_engagement_counts_distinct_sets() {
        let at = base_time();
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();
        let session_1 = Uuid::new_v4();
        let session_2 = Uuid::new_v4();

        let mut rows = Vec::new();
        for (user, session) in [(user_a, session_1), (user_a, session_1), (user_a, session_2), (user_b, session_2)] {
            let mut r = row(Tool::Thread, LogStatus::Completed, at);
            r.user_id = Some(user);
            r.session_id = Some(session);
            rows.push(r);
        }

        let engagement = summarize(&rows).daily_engagement;
        assert_eq!(engagement.len(), 1);
        assert_eq!(engagement[0].active_users, 2);
        assert_eq!(engagement[0].active_sessions, 2);
    }

    #[test]
    fn test_top_errors_sorted_by_count() {
        let at = base_time();
        let mut rows = Vec::new();
        for (message, count) in [("rate limited", 3), ("invalid key", 1), ("timeout", 2)] {
            for i in 0..count {
                let mut r = row(Tool::LieDetector, LogStatus::Failed, at + Duration::minutes(i));
                r.error_message = Some(message.to_string());
                rows.push(r);
            }
        }

        let errors = summarize(&rows).top_errors;
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].message, "rate limited");
        assert_eq!(errors[0].count, 3);
        assert_eq!(errors[0].last_seen, at + Duration::minutes(2));
        assert_eq!(errors[2].message, "invalid key");
    }

    #[test]
    fn test_top_users_ranking_is_order_invariant() {
        let at = base_time();
        let mut rows = Vec::new();
        // 12 users with increasing distinct-session counts
        for user_index in 0..12u32 {
            let user = Uuid::from_u128(user_index as u128 + 1);
            for _ in 0..=user_index {
                let mut r = row(Tool::Newsletter, LogStatus::Completed, at);
                r.user_id = Some(user);
                r.session_id = Some(Uuid::new_v4());
                rows.push(r);
            }
        }

        let baseline = summarize(&rows).top_users;
        assert_eq!(baseline.len(), 10);
        // Busiest user first
        assert_eq!(baseline[0].user_id, Uuid::from_u128(12));
        assert_eq!(baseline[0].sessions, 12);

        // Permute the rows a few different ways; the ranking must not move
        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(summarize(&reversed).top_users, baseline);

        let mut rotated = rows.clone();
        rotated.rotate_left(rows.len() / 3);
        assert_eq!(summarize(&rotated).top_users, baseline);

        let mut interleaved: Vec<_> = rows.iter().step_by(2).cloned().collect();
        interleaved.extend(rows.iter().skip(1).step_by(2).cloned());
        assert_eq!(summarize(&interleaved).top_users, baseline);
    }

    #[test]
    fn test_whole_summary_is_order_invariant() {
        let at = base_time();
        let mut rows = Vec::new();
        for day in 0..3 {
            for (tool, status) in [
                (Tool::Newsletter, LogStatus::Completed),
                (Tool::Thread, LogStatus::Failed),
                (Tool::Summary, LogStatus::Completed),
            ] {
                let mut r = row(tool, status, at + Duration::days(day));
                r.provider = Some(Provider::Google);
                r.tokens_used = Some(500);
                r.user_id = Some(Uuid::from_u128(7));
                r.session_id = Some(Uuid::from_u128(day as u128 + 100));
                if status == LogStatus::Failed {
                    r.error_message = Some("upstream 500".to_string());
                }
                rows.push(r);
            }
        }

        let baseline = summarize(&rows);
        let mut shuffled = rows.clone();
        shuffled.reverse();
        shuffled.rotate_right(4);
        assert_eq!(summarize(&shuffled), baseline);
    }

    #[test]
    fn test_day_window_is_inclusive_of_end_of_day() {
        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        let (start, end) = day_window(from, to);

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        // A row at 23:59:59 on the end date falls inside the window
        let late_row = Utc.with_ymd_and_hms(2024, 5, 7, 23, 59, 59).unwrap();
        assert!(late_row >= start && late_row <= end);

        // Midnight of the next day does not
        let next_day = Utc.with_ymd_and_hms(2024, 5, 8, 0, 0, 0).unwrap();
        assert!(next_day > end);
    }
}
