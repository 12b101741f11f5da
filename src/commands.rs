//! Tauri command handlers. Thin IPC adapters: argument plumbing, session
//! checks and feed lifecycle live here; everything else is in services.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tauri::State;

use crate::activity::{self, LogAction, TAB_LOG_DEBOUNCE};
use crate::error::AuthError;
use crate::gateway::changes::LeadChangeFeed;
use crate::listing::TablePage;
use crate::permissions::{self, PermissionOutcome};
use crate::services::admin::{self, TenantActivity, UsageOverview};
use crate::services::consultants::{self, ConsultantSortKey, RosterResult};
use crate::services::improvements::{self, SubmitResult};
use crate::services::leads::{self, LeadSortKey, LeadsResult};
use crate::session::SessionStore;
use crate::state::AppState;
use crate::types::{
    AccountRole, CompanySettings, ConsultantLead, ConsultantStats, DateFilter, ImprovementRequest,
    Lead, LoginContext, Session, Tab,
};

/// What the frontend needs to render a signed-in shell.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub username: String,
    pub role: AccountRole,
    pub default_tab: Tab,
}

/// Consultant table page together with its stats, which move with the
/// consultant filter.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantProjection {
    pub stats: ConsultantStats,
    pub page: TablePage<ConsultantLead>,
}

fn default_tab_for(context: LoginContext) -> Tab {
    match context {
        LoginContext::Operational => Tab::Leads,
        LoginContext::Administrative => Tab::Admin,
    }
}

fn context_matches(role: AccountRole, context: LoginContext) -> bool {
    match context {
        LoginContext::Operational => role == AccountRole::Operator,
        LoginContext::Administrative => role == AccountRole::Admin,
    }
}

fn require_session(state: &AppState) -> Result<Session, String> {
    state.session().ok_or_else(|| "Not authenticated".to_string())
}

fn require_admin(state: &AppState) -> Result<Session, String> {
    let session = require_session(state)?;
    if session.role != AccountRole::Admin {
        return Err("Administrative access required".to_string());
    }
    Ok(session)
}

/// Keep the lead change feed running exactly while someone authenticated
/// is on the leads view.
fn sync_lead_feed(state: &AppState, app: &tauri::AppHandle) {
    let wanted = state.session().is_some() && state.active_tab() == Tab::Leads;
    if !wanted {
        state.stop_lead_feed();
        return;
    }

    let Ok(mut guard) = state.lead_feed.lock() else {
        return;
    };
    if guard.is_some() {
        return;
    }
    match state.supabase() {
        Ok(client) => {
            let interval = Duration::from_secs(state.feed_interval_secs());
            *guard = Some(LeadChangeFeed::start(client, app.clone(), interval));
        }
        Err(e) => log::warn!("Lead change feed unavailable: {}", e),
    }
}

/// Arm the debounced tab-change log for a view, aborting any pending
/// write for a previously selected one.
fn schedule_tab_log(state: &AppState, session: &Session, tab: Tab) {
    let client = state.supabase();
    let username = session.username.clone();
    state.tab_log.schedule_after(TAB_LOG_DEBOUNCE, async move {
        activity::record(client, username, LogAction::TabChange, Some(tab.as_str().to_string()));
    });
}

#[tauri::command]
pub async fn login(
    username: String,
    password: String,
    context: LoginContext,
    app: tauri::AppHandle,
    state: State<'_, Arc<AppState>>,
) -> Result<SessionView, String> {
    use crate::auth::Authenticator;

    let authenticator = state.authenticator()?;
    let session = authenticator
        .authenticate(&username, &password)
        .map_err(|e| e.to_string())?;

    // Each login surface only accepts its own kind of account.
    if !context_matches(session.role, context) {
        return Err(AuthError::InvalidCredentials.to_string());
    }

    if let Ok(store) = SessionStore::new() {
        if let Err(e) = store.save(&session.username) {
            log::warn!("Could not persist session: {}", e);
        }
    }

    let default_tab = default_tab_for(context);
    state.set_session(session.clone());
    state.set_active_tab(default_tab);
    activity::record(
        state.supabase(),
        session.username.clone(),
        LogAction::Login,
        None,
    );
    sync_lead_feed(&state, &app);

    log::info!("{} signed in ({})", session.username, default_tab);
    Ok(SessionView {
        username: session.username,
        role: session.role,
        default_tab,
    })
}

/// Rehydrate a persisted session at startup. Anything that no longer
/// checks out (unknown user, wrong surface) clears the file instead of
/// erroring.
#[tauri::command]
pub async fn restore_session(
    context: LoginContext,
    app: tauri::AppHandle,
    state: State<'_, Arc<AppState>>,
) -> Result<Option<SessionView>, String> {
    let store = SessionStore::new()?;
    let Some(username) = store.load() else {
        return Ok(None);
    };

    let authenticator = state.authenticator()?;
    let Some(role) = authenticator.role_of(&username) else {
        log::warn!("Persisted session for unknown account {} — clearing", username);
        store.clear();
        return Ok(None);
    };
    if !context_matches(role, context) {
        store.clear();
        return Ok(None);
    }

    let canonical = authenticator
        .find_account(&username)
        .map(|a| a.username.clone())
        .unwrap_or(username);

    let default_tab = default_tab_for(context);
    state.set_session(Session {
        username: canonical.clone(),
        role,
    });
    state.set_active_tab(default_tab);
    sync_lead_feed(&state, &app);

    Ok(Some(SessionView {
        username: canonical,
        role,
        default_tab,
    }))
}

#[tauri::command]
pub async fn logout(state: State<'_, Arc<AppState>>) -> Result<(), String> {
    if let Some(session) = state.session() {
        activity::record(state.supabase(), session.username, LogAction::Logout, None);
    }
    state.reset_session_scope();
    if let Ok(store) = SessionStore::new() {
        store.clear();
    }
    Ok(())
}

/// Switch views. The tab-change log is debounced so rapid navigation
/// writes at most one row; the permission outcome is applied here and
/// reported back for the view to follow.
#[tauri::command]
pub async fn select_tab(
    tab: Tab,
    app: tauri::AppHandle,
    state: State<'_, Arc<AppState>>,
) -> Result<PermissionOutcome, String> {
    let session = require_session(&state)?;
    state.set_active_tab(tab);
    schedule_tab_log(&state, &session, tab);

    let outcome = run_access_check(&state, &session, tab).await;
    apply_outcome(&state, &session, &outcome);
    sync_lead_feed(&state, &app);
    Ok(outcome)
}

/// Re-check the current view without logging a navigation. Used for the
/// periodic revalidation while a view stays open.
#[tauri::command]
pub async fn check_access(
    app: tauri::AppHandle,
    state: State<'_, Arc<AppState>>,
) -> Result<PermissionOutcome, String> {
    let session = require_session(&state)?;
    let tab = state.active_tab();
    let outcome = run_access_check(&state, &session, tab).await;
    apply_outcome(&state, &session, &outcome);
    sync_lead_feed(&state, &app);
    Ok(outcome)
}

async fn run_access_check(state: &AppState, session: &Session, tab: Tab) -> PermissionOutcome {
    match state.supabase() {
        Ok(client) => permissions::check_access(Ok(&client), session, tab).await,
        Err(e) => permissions::check_access(Err(&e), session, tab).await,
    }
}

fn apply_outcome(state: &AppState, session: &Session, outcome: &PermissionOutcome) {
    match outcome {
        PermissionOutcome::Allow => {}
        // The landing view is the one actually visited; its debounced log
        // supersedes any pending write for the disallowed tab.
        PermissionOutcome::Redirect { tab } => {
            state.set_active_tab(*tab);
            schedule_tab_log(state, session, *tab);
        }
        // Revocation ends the session without a logout row; the user did
        // not choose to leave.
        PermissionOutcome::ForceLogout => {
            state.reset_session_scope();
            if let Ok(store) = SessionStore::new() {
                store.clear();
            }
        }
    }
}

// =============================================================================
// Leads view
// =============================================================================

#[tauri::command]
pub async fn get_dashboard_data(
    filter: Option<DateFilter>,
    state: State<'_, Arc<AppState>>,
) -> Result<LeadsResult, String> {
    require_session(&state)?;
    Ok(leads::load_dashboard(&state, filter).await)
}

#[tauri::command]
pub fn set_leads_search(query: String, state: State<'_, Arc<AppState>>) -> TablePage<Lead> {
    if let Ok(mut table) = state.leads_table.lock() {
        table.set_query(query);
    }
    leads::project_current(&state)
}

#[tauri::command]
pub fn select_leads_sort(key: LeadSortKey, state: State<'_, Arc<AppState>>) -> TablePage<Lead> {
    if let Ok(mut table) = state.leads_table.lock() {
        table.select_sort(key);
    }
    leads::project_current(&state)
}

#[tauri::command]
pub fn set_leads_page(page: usize, state: State<'_, Arc<AppState>>) -> TablePage<Lead> {
    if let Ok(mut table) = state.leads_table.lock() {
        table.set_page(page);
    }
    leads::project_current(&state)
}

// =============================================================================
// Consultants view
// =============================================================================

#[tauri::command]
pub async fn get_consultant_data(
    filter: Option<DateFilter>,
    state: State<'_, Arc<AppState>>,
) -> Result<RosterResult, String> {
    require_session(&state)?;
    Ok(consultants::load_roster(&state, filter).await)
}

#[tauri::command]
pub fn set_consultant_search(
    query: String,
    state: State<'_, Arc<AppState>>,
) -> TablePage<ConsultantLead> {
    if let Ok(mut table) = state.consultants_table.lock() {
        table.set_query(query);
    }
    consultants::project_current(&state)
}

#[tauri::command]
pub fn select_consultant_sort(
    key: ConsultantSortKey,
    state: State<'_, Arc<AppState>>,
) -> TablePage<ConsultantLead> {
    if let Ok(mut table) = state.consultants_table.lock() {
        table.select_sort(key);
    }
    consultants::project_current(&state)
}

#[tauri::command]
pub fn set_consultant_page(
    page: usize,
    state: State<'_, Arc<AppState>>,
) -> TablePage<ConsultantLead> {
    if let Ok(mut table) = state.consultants_table.lock() {
        table.set_page(page);
    }
    consultants::project_current(&state)
}

/// Pin the table to one consultant (exact name) or clear the filter.
/// Pagination restarts from the first page either way.
#[tauri::command]
pub fn set_consultant_filter(
    consultant: Option<String>,
    state: State<'_, Arc<AppState>>,
) -> ConsultantProjection {
    if let Ok(mut filter) = state.consultant_filter.lock() {
        *filter = consultant.filter(|c| !c.is_empty());
    }
    if let Ok(mut table) = state.consultants_table.lock() {
        table.set_page(1);
    }
    ConsultantProjection {
        stats: consultants::current_stats(&state),
        page: consultants::project_current(&state),
    }
}

/// Admin-set override for the active-consultant headline number.
#[tauri::command]
pub fn set_active_consultants_override(
    count: Option<usize>,
    state: State<'_, Arc<AppState>>,
) -> ConsultantStats {
    if let Ok(mut guard) = state.active_consultants_override.lock() {
        *guard = count;
    }
    consultants::current_stats(&state)
}

// =============================================================================
// Improvements view
// =============================================================================

#[tauri::command]
pub async fn submit_improvement(
    tipo: String,
    descricao: String,
    processos_manuais: String,
    prioridade: String,
    state: State<'_, Arc<AppState>>,
) -> Result<SubmitResult, String> {
    let session = require_session(&state)?;
    let request = ImprovementRequest {
        solicitante: session.username,
        tipo,
        descricao,
        processos_manuais,
        prioridade,
    };
    Ok(improvements::submit(&state, request).await)
}

// =============================================================================
// Admin view
// =============================================================================

#[tauri::command]
pub async fn get_usage_overview(state: State<'_, Arc<AppState>>) -> Result<UsageOverview, String> {
    require_admin(&state)?;
    admin::load_overview(&state).await
}

#[tauri::command]
pub fn get_tenant_activity(
    username: String,
    state: State<'_, Arc<AppState>>,
) -> Result<TenantActivity, String> {
    require_admin(&state)?;
    let logs = state.logs.lock().map_err(|_| "Lock poisoned".to_string())?;
    Ok(admin::tenant_activity(&logs, &username))
}

#[tauri::command]
pub fn get_tenant_options(state: State<'_, Arc<AppState>>) -> Result<Vec<String>, String> {
    require_admin(&state)?;
    let admin_username = state
        .authenticator()
        .ok()
        .and_then(|a| a.admin_username().map(String::from));
    let logs = state.logs.lock().map_err(|_| "Lock poisoned".to_string())?;
    Ok(admin::tenant_options(&logs, admin_username.as_deref()))
}

#[tauri::command]
pub async fn get_company_settings(
    username: String,
    state: State<'_, Arc<AppState>>,
) -> Result<CompanySettings, String> {
    require_admin(&state)?;
    let client = state.supabase().map_err(|e| e.to_string())?;
    let settings = client
        .fetch_company_settings(&username)
        .await
        .map_err(|e| e.to_string())?;
    Ok(settings.unwrap_or_else(|| CompanySettings::default_for(&username)))
}

#[tauri::command]
pub async fn save_company_settings(
    settings: CompanySettings,
    state: State<'_, Arc<AppState>>,
) -> Result<(), String> {
    require_admin(&state)?;
    let client = state.supabase().map_err(|e| e.to_string())?;
    client
        .upsert_company_settings(&settings)
        .await
        .map_err(|e| e.to_string())?;
    log::info!("Saved module toggles for {}", settings.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn redirect_supersedes_the_pending_tab_log() {
        let state = AppState::new();
        let session = Session {
            username: "Pulseenergy".to_string(),
            role: AccountRole::Operator,
        };
        state.set_active_tab(Tab::Consultants);

        // Stand in for the debounced log of the disallowed tab.
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        state
            .tab_log
            .schedule_after(Duration::from_millis(30), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        apply_outcome(&state, &session, &PermissionOutcome::Redirect { tab: Tab::Leads });

        tokio::time::sleep(Duration::from_millis(100)).await;
        // The pending write was aborted; only the landing view's log is armed.
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(state.active_tab(), Tab::Leads);
    }

    #[tokio::test]
    async fn forced_logout_drops_the_pending_tab_log() {
        let state = AppState::new();
        let session = Session {
            username: "Pulseenergy".to_string(),
            role: AccountRole::Operator,
        };
        state.set_session(session.clone());

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        state
            .tab_log
            .schedule_after(Duration::from_millis(30), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        apply_outcome(&state, &session, &PermissionOutcome::ForceLogout);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(state.session().is_none());
    }

    #[test]
    fn each_login_surface_maps_to_its_default_view() {
        assert_eq!(default_tab_for(LoginContext::Operational), Tab::Leads);
        assert_eq!(default_tab_for(LoginContext::Administrative), Tab::Admin);
    }

    #[test]
    fn login_surfaces_only_accept_their_own_role() {
        assert!(context_matches(AccountRole::Operator, LoginContext::Operational));
        assert!(context_matches(AccountRole::Admin, LoginContext::Administrative));
        assert!(!context_matches(AccountRole::Admin, LoginContext::Operational));
        assert!(!context_matches(AccountRole::Operator, LoginContext::Administrative));
    }
}
