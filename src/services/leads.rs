//! Leads dashboard: fetch, headline stats and table projection.
//!
//! A fetch is issued per filter change and re-issued when the change feed
//! fires. Only the latest fetch may publish its result; anything older
//! resolves as `Superseded` and the view discards it.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::listing::{self, SortDirection, TablePage};
use crate::state::AppState;
use crate::types::{DashboardStats, DateFilter, Lead};

/// Sortable columns of the leads table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadSortKey {
    CreatedAt,
    Name,
    Number,
    Qualification,
    Stage,
}

/// Outcome of a dashboard load, tagged for the view layer.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LeadsResult {
    Success {
        stats: DashboardStats,
        page: TablePage<Lead>,
    },
    /// A newer fetch was issued while this one was in flight.
    Superseded,
    Error {
        message: String,
    },
}

pub fn compare(a: &Lead, b: &Lead, key: LeadSortKey, direction: SortDirection) -> std::cmp::Ordering {
    match key {
        LeadSortKey::CreatedAt => {
            listing::cmp_nullable(Some(&a.created_at), Some(&b.created_at), direction)
        }
        LeadSortKey::Name => listing::cmp_nullable(a.name.as_deref(), b.name.as_deref(), direction),
        LeadSortKey::Number => {
            listing::cmp_nullable(Some(a.number.as_str()), Some(b.number.as_str()), direction)
        }
        LeadSortKey::Qualification => {
            listing::cmp_nullable(a.qualificacao.as_deref(), b.qualificacao.as_deref(), direction)
        }
        LeadSortKey::Stage => listing::cmp_nullable(a.etapa.as_ref(), b.etapa.as_ref(), direction),
    }
}

fn search_fields(lead: &Lead) -> [Option<&str>; 2] {
    [lead.name.as_deref(), Some(lead.number.as_str())]
}

/// Headline numbers for the fetched set. "Today" is the local calendar
/// day, matching what the person at the desk means by it.
pub fn compute_stats(leads: &[Lead], assignment_count: u64) -> DashboardStats {
    let today = Local::now().date_naive();
    let leads_today = leads
        .iter()
        .filter(|l| l.created_at.with_timezone(&Local).date_naive() == today)
        .count();
    DashboardStats {
        total_leads: leads.len(),
        leads_today,
        leads_per_consultant: assignment_count,
    }
}

/// Project the cached leads through the current query, sort and page.
pub fn project_current(state: &AppState) -> TablePage<Lead> {
    let leads = state.leads.lock().map(|g| g.clone()).unwrap_or_default();
    let table = state
        .leads_table
        .lock()
        .map(|g| g.clone())
        .unwrap_or_else(|_| {
            crate::listing::TableState::new(LeadSortKey::CreatedAt, SortDirection::Descending)
        });
    listing::project(
        &leads,
        &table.query,
        search_fields,
        |a, b| compare(a, b, table.sort.key, table.sort.direction),
        table.page,
    )
}

/// Full dashboard load: leads (optionally date-bounded), assignment count
/// and projection. Publishes into state only if still the latest fetch.
pub async fn load_dashboard(state: &AppState, filter: Option<DateFilter>) -> LeadsResult {
    let generation = state.begin_leads_fetch();

    let client = match state.supabase() {
        Ok(client) => client,
        Err(e) => {
            return LeadsResult::Error {
                message: e.to_string(),
            }
        }
    };

    let range = filter.filter(|f| !f.is_empty());
    let leads = match client.fetch_leads(range.as_ref()).await {
        Ok(leads) => leads,
        Err(e) => {
            if !state.leads_fetch_is_current(generation) {
                return LeadsResult::Superseded;
            }
            return LeadsResult::Error {
                message: e.to_string(),
            };
        }
    };

    // The count is a secondary statistic; its failure must not take the
    // whole dashboard down.
    let assignment_count = match client.count_consultant_assignments().await {
        Ok(count) => count,
        Err(e) => {
            log::warn!("Assignment count unavailable: {}", e);
            0
        }
    };

    if !state.leads_fetch_is_current(generation) {
        return LeadsResult::Superseded;
    }

    let stats = compute_stats(&leads, assignment_count);
    if let Ok(mut guard) = state.leads.lock() {
        *guard = leads;
    }

    LeadsResult::Success {
        stats,
        page: project_current(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn lead(id: i64, name: Option<&str>, number: &str, etapa: Option<i64>) -> Lead {
        Lead {
            id,
            created_at: Utc::now(),
            name: name.map(String::from),
            number: number.to_string(),
            qualificacao: None,
            resumo_conversa: None,
            etapa,
            timeout: None,
        }
    }

    #[test]
    fn stats_count_todays_leads_by_local_day() {
        let mut old = lead(1, Some("Ana"), "11999990000", None);
        old.created_at = Utc::now() - Duration::days(3);
        let leads = vec![old, lead(2, Some("Bruno"), "11888880000", None)];

        let stats = compute_stats(&leads, 7);
        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.leads_today, 1);
        assert_eq!(stats.leads_per_consultant, 7);
    }

    #[test]
    fn stats_on_empty_set_are_zero() {
        let stats = compute_stats(&[], 0);
        assert_eq!(stats.total_leads, 0);
        assert_eq!(stats.leads_today, 0);
    }

    #[test]
    fn stage_sort_puts_missing_stages_last() {
        let mut leads = vec![
            lead(1, None, "1", Some(2)),
            lead(2, None, "2", None),
            lead(3, None, "3", Some(1)),
        ];
        leads.sort_by(|a, b| compare(a, b, LeadSortKey::Stage, SortDirection::Ascending));
        assert_eq!(leads[0].etapa, Some(1));
        assert_eq!(leads[1].etapa, Some(2));
        assert_eq!(leads[2].etapa, None);
    }

    #[test]
    fn name_sort_descending_keeps_nulls_last() {
        let mut leads = vec![
            lead(1, Some("Ana"), "1", None),
            lead(2, None, "2", None),
            lead(3, Some("Bruno"), "3", None),
        ];
        leads.sort_by(|a, b| compare(a, b, LeadSortKey::Name, SortDirection::Descending));
        assert_eq!(leads[0].name.as_deref(), Some("Bruno"));
        assert_eq!(leads[1].name.as_deref(), Some("Ana"));
        assert_eq!(leads[2].name, None);
    }
}
