//! Consultant distribution view: roster fetch, per-consultant filtering,
//! headline stats and table projection.
//!
//! The roster comes from webhooks, not the hosted store. An unfiltered
//! load hits the GET endpoint; a calendar range hits the POST endpoint
//! and requires both bounds.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::listing::{self, SortDirection, TablePage};
use crate::state::AppState;
use crate::types::{ConsultantLead, ConsultantStats, DateFilter};

/// Sortable columns of the consultant-leads table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsultantSortKey {
    Id,
    Consultant,
    Phone,
    Date,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RosterResult {
    Success {
        stats: ConsultantStats,
        page: TablePage<ConsultantLead>,
        /// Distinct consultant names for the filter dropdown.
        consultants: Vec<String>,
    },
    Superseded,
    Error {
        message: String,
    },
}

pub fn compare(
    a: &ConsultantLead,
    b: &ConsultantLead,
    key: ConsultantSortKey,
    direction: SortDirection,
) -> std::cmp::Ordering {
    match key {
        ConsultantSortKey::Id => listing::cmp_nullable(Some(&a.id), Some(&b.id), direction),
        ConsultantSortKey::Consultant => {
            listing::cmp_nullable(a.consultor.as_deref(), b.consultor.as_deref(), direction)
        }
        ConsultantSortKey::Phone => listing::cmp_nullable(
            a.telefone_do_lead.as_deref(),
            b.telefone_do_lead.as_deref(),
            direction,
        ),
        ConsultantSortKey::Date => {
            // ISO dates compare correctly as strings.
            listing::cmp_nullable(a.data.as_deref(), b.data.as_deref(), direction)
        }
    }
}

fn search_fields(row: &ConsultantLead) -> [Option<&str>; 2] {
    [row.consultor.as_deref(), row.telefone_do_lead.as_deref()]
}

/// Distinct non-empty consultant names, sorted.
pub fn consultant_options(rows: &[ConsultantLead]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if let Some(name) = row.consultor.as_deref() {
            let name = name.trim();
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    names
}

/// Headline numbers for a (possibly consultant-filtered) set. The active
/// consultant count is taken from the full roster unless the admin has
/// pinned an override.
pub fn compute_stats(
    filtered: &[&ConsultantLead],
    all: &[ConsultantLead],
    override_count: Option<usize>,
) -> ConsultantStats {
    let today = Local::now().date_naive().to_string();
    let sent_today = filtered
        .iter()
        .filter(|r| r.data.as_deref() == Some(today.as_str()))
        .count();
    ConsultantStats {
        total_sent: filtered.len(),
        sent_today,
        active_consultants: override_count.unwrap_or_else(|| consultant_options(all).len()),
    }
}

fn filtered_rows<'a>(
    rows: &'a [ConsultantLead],
    consultant: Option<&str>,
) -> Vec<&'a ConsultantLead> {
    match consultant {
        Some(name) if !name.is_empty() => rows
            .iter()
            .filter(|r| r.consultor.as_deref() == Some(name))
            .collect(),
        _ => rows.iter().collect(),
    }
}

/// Project the cached roster through the consultant filter, query, sort
/// and page.
pub fn project_current(state: &AppState) -> TablePage<ConsultantLead> {
    let rows = state
        .consultant_leads
        .lock()
        .map(|g| g.clone())
        .unwrap_or_default();
    let filter = state
        .consultant_filter
        .lock()
        .map(|g| g.clone())
        .unwrap_or_default();
    let table = state
        .consultants_table
        .lock()
        .map(|g| g.clone())
        .unwrap_or_else(|_| {
            crate::listing::TableState::new(ConsultantSortKey::Id, SortDirection::Descending)
        });

    let scoped: Vec<ConsultantLead> = filtered_rows(&rows, filter.as_deref())
        .into_iter()
        .cloned()
        .collect();
    listing::project(
        &scoped,
        &table.query,
        search_fields,
        |a, b| compare(a, b, table.sort.key, table.sort.direction),
        table.page,
    )
}

/// Stats for the current filter/override, from the cached roster.
pub fn current_stats(state: &AppState) -> ConsultantStats {
    let rows = state
        .consultant_leads
        .lock()
        .map(|g| g.clone())
        .unwrap_or_default();
    let filter = state
        .consultant_filter
        .lock()
        .map(|g| g.clone())
        .unwrap_or_default();
    let override_count = state
        .active_consultants_override
        .lock()
        .map(|g| *g)
        .unwrap_or_default();

    let filtered = filtered_rows(&rows, filter.as_deref());
    compute_stats(&filtered, &rows, override_count)
}

/// Full roster load. An empty filter means the whole roster; a range goes
/// to the date-filtered endpoint, which rejects half-filled ranges
/// locally.
pub async fn load_roster(state: &AppState, filter: Option<DateFilter>) -> RosterResult {
    let generation = state.begin_roster_fetch();

    let client = match state.webhooks() {
        Ok(client) => client,
        Err(e) => {
            return RosterResult::Error {
                message: e.to_string(),
            }
        }
    };

    let fetched = match filter.filter(|f| !f.is_empty()) {
        Some(range) => client.fetch_roster_by_range(&range.start, &range.end).await,
        None => client.fetch_roster().await,
    };
    let mut rows = match fetched {
        Ok(rows) => rows,
        Err(e) => {
            if !state.roster_fetch_is_current(generation) {
                return RosterResult::Superseded;
            }
            return RosterResult::Error {
                message: e.to_string(),
            };
        }
    };

    if !state.roster_fetch_is_current(generation) {
        return RosterResult::Superseded;
    }

    // Newest assignments first, regardless of endpoint ordering.
    rows.sort_by(|a, b| b.id.cmp(&a.id));
    let consultants = consultant_options(&rows);
    if let Ok(mut guard) = state.consultant_leads.lock() {
        *guard = rows;
    }

    RosterResult::Success {
        stats: current_stats(state),
        page: project_current(state),
        consultants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, consultor: Option<&str>, phone: Option<&str>, data: Option<&str>) -> ConsultantLead {
        ConsultantLead {
            id,
            consultor: consultor.map(String::from),
            telefone_do_lead: phone.map(String::from),
            data: data.map(String::from),
        }
    }

    #[test]
    fn options_are_distinct_trimmed_and_sorted() {
        let rows = vec![
            row(1, Some("Carlos"), None, None),
            row(2, Some("Ana "), None, None),
            row(3, Some("Carlos"), None, None),
            row(4, Some(""), None, None),
            row(5, None, None, None),
        ];
        assert_eq!(consultant_options(&rows), vec!["Ana", "Carlos"]);
    }

    #[test]
    fn stats_count_todays_assignments_by_date_string() {
        let today = Local::now().date_naive().to_string();
        let rows = vec![
            row(1, Some("Ana"), None, Some(&today)),
            row(2, Some("Ana"), None, Some("2020-01-01")),
            row(3, Some("Carlos"), None, Some(&today)),
        ];
        let refs: Vec<&ConsultantLead> = rows.iter().collect();
        let stats = compute_stats(&refs, &rows, None);
        assert_eq!(stats.total_sent, 3);
        assert_eq!(stats.sent_today, 2);
        assert_eq!(stats.active_consultants, 2);
    }

    #[test]
    fn override_replaces_the_derived_consultant_count() {
        let rows = vec![row(1, Some("Ana"), None, None)];
        let refs: Vec<&ConsultantLead> = rows.iter().collect();
        let stats = compute_stats(&refs, &rows, Some(12));
        assert_eq!(stats.active_consultants, 12);
    }

    #[test]
    fn consultant_filter_is_exact_match() {
        let rows = vec![
            row(1, Some("Ana"), None, None),
            row(2, Some("Ana Paula"), None, None),
            row(3, Some("Carlos"), None, None),
        ];
        let filtered = filtered_rows(&rows, Some("Ana"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 1);

        // No filter passes everything through.
        assert_eq!(filtered_rows(&rows, None).len(), 3);
        assert_eq!(filtered_rows(&rows, Some("")).len(), 3);
    }

    #[test]
    fn date_sort_orders_iso_strings() {
        let mut rows = vec![
            row(1, None, None, Some("2024-03-15")),
            row(2, None, None, None),
            row(3, None, None, Some("2024-01-02")),
        ];
        rows.sort_by(|a, b| compare(a, b, ConsultantSortKey::Date, SortDirection::Ascending));
        assert_eq!(rows[0].data.as_deref(), Some("2024-01-02"));
        assert_eq!(rows[1].data.as_deref(), Some("2024-03-15"));
        assert_eq!(rows[2].data, None);
    }
}
