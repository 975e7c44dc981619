use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Utc};
use memory_core::GrowthPoint;

use crate::types::{ActivityKind, PerformanceStats, RecentActivityItem, SearchStats};

/// Start of the local calendar day containing `now`, expressed back as a
/// UTC instant. `offset` is the deployment's configured local-time offset
/// (`LOCAL_UTC_OFFSET_MINUTES`) — window boundaries are anchored to local
/// midnight, not UTC midnight, so a deployment west of UTC doesn't see
/// "today" roll over in the middle of its afternoon.
pub(crate) fn start_of_today(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    offset
        .with_ymd_and_hms(local.year(), local.month(), local.day(), 0, 0, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

pub(crate) fn start_of_week(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    let days_since_monday = local.weekday().num_days_from_monday() as i64;
    start_of_today(now, offset) - Duration::days(days_since_monday)
}

pub(crate) fn start_of_month(now: DateTime<Utc>, offset: FixedOffset) -> DateTime<Utc> {
    let local = now.with_timezone(&offset);
    offset
        .with_ymd_and_hms(local.year(), local.month(), 1, 0, 0, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

pub(crate) fn search_stats_from_counts(today: i64, week: i64, month: i64) -> SearchStats {
    SearchStats {
        searches_today: today,
        searches_this_week: week,
        searches_this_month: month,
    }
}

/// growth is derived from the memories table, never from the activity
/// log, so it stays correct even after old log entries are pruned.
pub fn growth_points_to_json(points: &[GrowthPoint]) -> serde_json::Value {
    serde_json::json!(points
        .iter()
        .map(|p| serde_json::json!({ "date": p.date.to_string(), "count": p.count }))
        .collect::<Vec<_>>())
}

pub(crate) fn describe_search(query: &str) -> String {
    let truncated: String = query.chars().take(50).collect();
    format!("Searched for: {truncated}")
}

pub(crate) fn describe_api_key_created(name: &str) -> String {
    format!("Created API key: {name}")
}

pub(crate) fn describe_api_key_deleted(name: &str) -> String {
    format!("Deleted API key: {name}")
}

pub(crate) fn describe_login() -> String {
    "Logged in".to_string()
}

pub(crate) fn describe_memory_deleted() -> String {
    "Deleted a memory".to_string()
}

pub(crate) fn describe(kind: ActivityKind, detail: &serde_json::Value) -> String {
    match kind {
        ActivityKind::MemoryStored => detail
            .get("category")
            .and_then(|v| v.as_str())
            .map(|c| format!("Stored memory in {c} category"))
            .unwrap_or_else(|| "Stored a memory".to_string()),
        ActivityKind::MemorySearch => detail
            .get("query")
            .and_then(|v| v.as_str())
            .map(describe_search)
            .unwrap_or_else(|| "Searched memories".to_string()),
        ActivityKind::MemoryDeleted => describe_memory_deleted(),
        ActivityKind::ApiKeyCreated => detail
            .get("name")
            .and_then(|v| v.as_str())
            .map(describe_api_key_created)
            .unwrap_or_else(|| "Created an API key".to_string()),
        ActivityKind::ApiKeyDeleted => detail
            .get("name")
            .and_then(|v| v.as_str())
            .map(describe_api_key_deleted)
            .unwrap_or_else(|| "Deleted an API key".to_string()),
        ActivityKind::Login => describe_login(),
    }
}

pub(crate) fn to_recent_activity_item(
    kind: ActivityKind,
    detail: &serde_json::Value,
    created_at: DateTime<Utc>,
) -> RecentActivityItem {
    RecentActivityItem {
        description: describe(kind, detail),
        kind,
        created_at,
    }
}

pub(crate) fn percentile(sorted: &[i64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct / 100.0 * (sorted.len() as f64 - 1.0)).round() as usize;
    sorted[rank.min(sorted.len() - 1)] as f64
}

pub(crate) fn performance_stats_from_durations(
    mut durations: Vec<i64>,
    open_db_connections: u32,
    uptime_pct: f64,
    cache_hit_rate: f64,
) -> PerformanceStats {
    durations.sort_unstable();
    let total = durations.len() as i64;
    let avg = if durations.is_empty() {
        0.0
    } else {
        durations.iter().sum::<i64>() as f64 / durations.len() as f64
    };
    PerformanceStats {
        avg_duration_ms_today: avg,
        p95_duration_ms_today: percentile(&durations, 95.0),
        total_requests_today: total,
        open_db_connections,
        uptime_pct,
        cache_hit_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn start_of_today_truncates_time() {
        let now = dt(2026, 7, 27, 15);
        assert_eq!(start_of_today(now, utc()), dt(2026, 7, 27, 0));
    }

    #[test]
    fn start_of_week_lands_on_monday() {
        // 2026-07-27 is a Monday.
        let monday = dt(2026, 7, 27, 9);
        assert_eq!(start_of_week(monday, utc()), dt(2026, 7, 27, 0));
        let wednesday = dt(2026, 7, 29, 9);
        assert_eq!(start_of_week(wednesday, utc()), dt(2026, 7, 27, 0));
    }

    #[test]
    fn start_of_today_anchors_to_the_configured_local_offset() {
        // 23:30 UTC on the 27th is already past local midnight on the 28th
        // for a deployment 1 hour east of UTC.
        let east_one = FixedOffset::east_opt(3600).unwrap();
        let now = dt(2026, 7, 27, 23) + Duration::minutes(30);
        assert_eq!(start_of_today(now, east_one), dt(2026, 7, 27, 23));

        // A deployment 1 hour west of UTC is still on the 27th at that
        // same instant.
        let west_one = FixedOffset::west_opt(3600).unwrap();
        assert_eq!(start_of_today(now, west_one), dt(2026, 7, 27, 1));
    }

    #[test]
    fn start_of_month_lands_on_first() {
        let mid = dt(2026, 7, 27, 9);
        assert_eq!(start_of_month(mid, utc()), dt(2026, 7, 1, 0));
    }

    #[test]
    fn describe_uses_detail_fields_when_present() {
        let detail = serde_json::json!({ "query": "typescript preferences" });
        assert_eq!(
            describe(ActivityKind::MemorySearch, &detail),
            "Searched for: typescript preferences"
        );
    }

    #[test]
    fn describe_search_truncates_long_queries() {
        let long = "a".repeat(80);
        let described = describe_search(&long);
        assert_eq!(described, format!("Searched for: {}", "a".repeat(50)));
    }

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn performance_stats_computes_average_and_p95() {
        let stats = performance_stats_from_durations(vec![10, 20, 30, 40, 50], 4, 99.9, 0.8);
        assert_eq!(stats.total_requests_today, 5);
        assert_eq!(stats.avg_duration_ms_today, 30.0);
        assert_eq!(stats.p95_duration_ms_today, 50.0);
    }
}
