use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::activity::TabLogDebouncer;
use crate::auth::ConfigAuthenticator;
use crate::error::GatewayError;
use crate::gateway::changes::LeadChangeFeed;
use crate::gateway::supabase::SupabaseClient;
use crate::gateway::webhooks::WebhookClient;
use crate::listing::{SortDirection, TableState};
use crate::services::consultants::ConsultantSortKey;
use crate::services::leads::LeadSortKey;
use crate::types::{AccessLogEntry, Config, ConsultantLead, Lead, Session, Tab};

/// Application state managed by Tauri.
///
/// All shared state is process-local UI state scoped to the active
/// session; one window serves one user at a time by construction.
pub struct AppState {
    pub config: Mutex<Option<Config>>,
    pub session: Mutex<Option<Session>>,
    pub active_tab: Mutex<Tab>,

    // Last-fetched lists plus their table presentation state.
    pub leads: Mutex<Vec<Lead>>,
    pub leads_table: Mutex<TableState<LeadSortKey>>,
    pub consultant_leads: Mutex<Vec<ConsultantLead>>,
    pub consultants_table: Mutex<TableState<ConsultantSortKey>>,
    pub consultant_filter: Mutex<Option<String>>,
    pub active_consultants_override: Mutex<Option<usize>>,
    pub logs: Mutex<Vec<AccessLogEntry>>,

    // Fetch-generation guards: only the latest-issued fetch per view may
    // apply its response.
    leads_generation: AtomicU64,
    roster_generation: AtomicU64,

    pub tab_log: TabLogDebouncer,
    pub lead_feed: Mutex<Option<LeadChangeFeed>>,
}

impl AppState {
    pub fn new() -> Self {
        let config = match load_config() {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("No usable configuration: {}", e);
                None
            }
        };

        Self {
            config: Mutex::new(config),
            session: Mutex::new(None),
            active_tab: Mutex::new(Tab::Leads),
            leads: Mutex::new(Vec::new()),
            leads_table: Mutex::new(TableState::new(
                LeadSortKey::CreatedAt,
                SortDirection::Descending,
            )),
            consultant_leads: Mutex::new(Vec::new()),
            consultants_table: Mutex::new(TableState::new(
                ConsultantSortKey::Id,
                SortDirection::Descending,
            )),
            consultant_filter: Mutex::new(None),
            active_consultants_override: Mutex::new(None),
            logs: Mutex::new(Vec::new()),
            leads_generation: AtomicU64::new(0),
            roster_generation: AtomicU64::new(0),
            tab_log: TabLogDebouncer::new(),
            lead_feed: Mutex::new(None),
        }
    }

    /// Snapshot of the current session, if authenticated.
    pub fn session(&self) -> Option<Session> {
        self.session.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn set_session(&self, session: Session) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session);
        }
    }

    pub fn clear_session(&self) {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab.lock().map(|g| *g).unwrap_or(Tab::Leads)
    }

    pub fn set_active_tab(&self, tab: Tab) {
        if let Ok(mut guard) = self.active_tab.lock() {
            *guard = tab;
        }
    }

    /// Authenticator over the configured account list.
    pub fn authenticator(&self) -> Result<ConfigAuthenticator, String> {
        let guard = self.config.lock().map_err(|_| "Lock poisoned")?;
        let config = guard
            .as_ref()
            .ok_or("No configuration loaded. Create ~/.automatize/config.json")?;
        Ok(ConfigAuthenticator::new(config.accounts.clone()))
    }

    /// Fresh REST client for the hosted store.
    pub fn supabase(&self) -> Result<SupabaseClient, GatewayError> {
        let guard = self
            .config
            .lock()
            .map_err(|_| GatewayError::Configuration("config lock poisoned".to_string()))?;
        let config = guard.as_ref().ok_or_else(|| {
            GatewayError::Configuration(
                "No configuration loaded. Create ~/.automatize/config.json".to_string(),
            )
        })?;
        SupabaseClient::from_config(config)
    }

    /// Fresh client for the webhook endpoints.
    pub fn webhooks(&self) -> Result<WebhookClient, GatewayError> {
        let guard = self
            .config
            .lock()
            .map_err(|_| GatewayError::Configuration("config lock poisoned".to_string()))?;
        let config = guard.as_ref().ok_or_else(|| {
            GatewayError::Configuration(
                "No configuration loaded. Create ~/.automatize/config.json".to_string(),
            )
        })?;
        Ok(WebhookClient::from_config(config))
    }

    /// Seconds between change-feed polls.
    pub fn feed_interval_secs(&self) -> u64 {
        self.config
            .lock()
            .ok()
            .and_then(|g| g.as_ref().map(|c| c.feed_interval_secs))
            .unwrap_or(15)
    }

    /// Issue a new lead-fetch generation.
    pub fn begin_leads_fetch(&self) -> u64 {
        self.leads_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// True while no newer lead fetch has been issued.
    pub fn leads_fetch_is_current(&self, generation: u64) -> bool {
        self.leads_generation.load(Ordering::SeqCst) == generation
    }

    pub fn begin_roster_fetch(&self) -> u64 {
        self.roster_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn roster_fetch_is_current(&self, generation: u64) -> bool {
        self.roster_generation.load(Ordering::SeqCst) == generation
    }

    /// Stop the lead change feed if one is running.
    pub fn stop_lead_feed(&self) {
        if let Ok(mut guard) = self.lead_feed.lock() {
            if let Some(feed) = guard.take() {
                feed.stop();
            }
        }
    }

    /// Drop everything scoped to the authenticated session.
    pub fn reset_session_scope(&self) {
        self.clear_session();
        self.tab_log.cancel();
        self.stop_lead_feed();
        self.set_active_tab(Tab::Leads);
        if let Ok(mut guard) = self.leads.lock() {
            guard.clear();
        }
        if let Ok(mut guard) = self.consultant_leads.lock() {
            guard.clear();
        }
        if let Ok(mut guard) = self.logs.lock() {
            guard.clear();
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical config file path (~/.automatize/config.json).
pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".automatize").join("config.json"))
}

/// Load configuration from ~/.automatize/config.json
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;

    if !path.exists() {
        return Err(format!(
            "Config file not found at {}. Create it with {{ \"supabaseUrl\": ..., \"supabaseKey\": ... }}",
            path.display()
        ));
    }

    let content = fs::read_to_string(&path).map_err(|e| format!("Failed to read config: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_generations_are_monotonic_and_supersede() {
        let state = AppState::new();

        let first = state.begin_leads_fetch();
        assert!(state.leads_fetch_is_current(first));

        let second = state.begin_leads_fetch();
        assert!(second > first);
        assert!(!state.leads_fetch_is_current(first));
        assert!(state.leads_fetch_is_current(second));
    }

    #[test]
    fn roster_generations_are_independent_of_lead_generations() {
        let state = AppState::new();
        let lead_gen = state.begin_leads_fetch();
        let roster_gen = state.begin_roster_fetch();
        assert!(state.leads_fetch_is_current(lead_gen));
        assert!(state.roster_fetch_is_current(roster_gen));
    }

    #[test]
    fn reset_session_scope_clears_session_and_caches() {
        let state = AppState::new();
        state.set_session(crate::types::Session {
            username: "Pulseenergy".to_string(),
            role: crate::types::AccountRole::Operator,
        });
        state.set_active_tab(Tab::Consultants);
        state.logs.lock().unwrap().push(crate::types::AccessLogEntry {
            id: 1,
            created_at: chrono::Utc::now(),
            username: "Pulseenergy".to_string(),
            action: "login".to_string(),
            details: None,
        });

        state.reset_session_scope();

        assert!(state.session().is_none());
        assert_eq!(state.active_tab(), Tab::Leads);
        assert!(state.logs.lock().unwrap().is_empty());
    }
}
