//! Admin usage panel: aggregate statistics over the access-log window.
//!
//! All aggregation happens over the most recent window the gateway
//! returns (newest first). Ranking ties keep the first-seen entry in
//! that order, so repeated loads of unchanged data rank identically.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::state::AppState;
use crate::types::AccessLogEntry;

/// Placeholder shown when a ranking has no data.
const NONE_SENTINEL: &str = "-";

/// How many recent entries a tenant drill-down shows.
const RECENT_LIMIT: usize = 5;

/// Global usage numbers across all tenants.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOverview {
    pub total_access: usize,
    pub most_active_user: String,
    pub most_active_user_count: usize,
    pub most_visited_page: String,
    pub accesses_today: usize,
}

/// Drill-down for one tenant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantActivity {
    pub total_access: usize,
    pub last_access: Option<DateTime<Utc>>,
    pub most_visited_page: String,
    pub recent: Vec<AccessLogEntry>,
}

/// Occurrence counts in first-seen order. Returning a Vec instead of a
/// map keeps ranking ties deterministic.
fn count_in_order<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts
}

/// The first entry with the strictly highest count.
fn top(counts: &[(String, usize)]) -> Option<(&str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, n)| *count > n) {
            best = Some((value, *count));
        }
    }
    best
}

fn count_today(logs: &[AccessLogEntry]) -> usize {
    let today = Local::now().date_naive();
    logs.iter()
        .filter(|l| l.created_at.with_timezone(&Local).date_naive() == today)
        .count()
}

/// Page visits are the `details` of tab-change rows; login/logout rows
/// carry no page.
fn visited_pages(logs: &[AccessLogEntry]) -> impl Iterator<Item = &str> {
    logs.iter()
        .filter(|l| l.action == "tab_change")
        .filter_map(|l| l.details.as_deref())
}

pub fn overview(logs: &[AccessLogEntry]) -> UsageOverview {
    let user_counts = count_in_order(logs.iter().map(|l| l.username.as_str()));
    let (most_active_user, most_active_user_count) = top(&user_counts)
        .map(|(u, n)| (u.to_string(), n))
        .unwrap_or((NONE_SENTINEL.to_string(), 0));

    let page_counts = count_in_order(visited_pages(logs));
    let most_visited_page = top(&page_counts)
        .map(|(p, _)| p.to_string())
        .unwrap_or(NONE_SENTINEL.to_string());

    UsageOverview {
        total_access: logs.len(),
        most_active_user,
        most_active_user_count,
        most_visited_page,
        accesses_today: count_today(logs),
    }
}

pub fn tenant_activity(logs: &[AccessLogEntry], username: &str) -> TenantActivity {
    let rows: Vec<&AccessLogEntry> = logs.iter().filter(|l| l.username == username).collect();

    let page_counts = count_in_order(
        rows.iter()
            .filter(|l| l.action == "tab_change")
            .filter_map(|l| l.details.as_deref()),
    );
    let most_visited_page = top(&page_counts)
        .map(|(p, _)| p.to_string())
        .unwrap_or(NONE_SENTINEL.to_string());

    TenantActivity {
        total_access: rows.len(),
        // Rows arrive newest first.
        last_access: rows.first().map(|l| l.created_at),
        most_visited_page,
        recent: rows.iter().take(RECENT_LIMIT).map(|l| (*l).clone()).collect(),
    }
}

/// Distinct usernames for the dropdown, excluding the administrator, in
/// first-seen order (the window is newest first, so most recently active
/// tenants lead the list).
pub fn tenant_options(logs: &[AccessLogEntry], admin_username: Option<&str>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for log in logs {
        if Some(log.username.as_str()) == admin_username {
            continue;
        }
        if !names.iter().any(|n| n == &log.username) {
            names.push(log.username.clone());
        }
    }
    names
}

/// Refresh the log window into state and return the overview.
pub async fn load_overview(state: &AppState) -> Result<UsageOverview, String> {
    let client = state.supabase().map_err(|e| e.to_string())?;
    let logs = client.fetch_logs().await.map_err(|e| e.to_string())?;
    let result = overview(&logs);
    if let Ok(mut guard) = state.logs.lock() {
        *guard = logs;
    }
    Ok(result)
}
