use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration stored in ~/.automatize/config.json
///
/// Holds the backend connection, the three webhook endpoints and the
/// account list. Passwords are stored as SHA-256 hex digests, never
/// plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    #[serde(default)]
    pub webhooks: WebhookConfig,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    /// Seconds between lead change-feed polls.
    #[serde(default = "default_feed_interval")]
    pub feed_interval_secs: u64,
}

fn default_feed_interval() -> u64 {
    15
}

/// Webhook endpoints for the consultant roster and improvement submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default = "default_roster_url")]
    pub roster_url: String,
    #[serde(default = "default_roster_range_url")]
    pub roster_range_url: String,
    #[serde(default = "default_improvements_url")]
    pub improvements_url: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            roster_url: default_roster_url(),
            roster_range_url: default_roster_range_url(),
            improvements_url: default_improvements_url(),
        }
    }
}

fn default_roster_url() -> String {
    "https://www.pulseenergy.shop/webhook/consultores".to_string()
}

fn default_roster_range_url() -> String {
    "https://www.pulseenergy.shop/webhook/datas".to_string()
}

fn default_improvements_url() -> String {
    "https://www.pulseenergy.shop/webhook/dash".to_string()
}

/// One login account. The digest is the lowercase SHA-256 hex of the
/// password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub username: String,
    pub password_sha256: String,
    #[serde(default)]
    pub role: AccountRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    Operator,
    Admin,
}

/// An authenticated identity. Never ambient — always read from AppState
/// through its accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub username: String,
    pub role: AccountRole,
}

/// Which login surface the frontend is running on. The admin route gets a
/// different login form and a different post-login default view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginContext {
    Operational,
    Administrative,
}

/// Top-level views. Mutually exclusive; one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    Leads,
    Consultants,
    Improvements,
    Admin,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Leads => "leads",
            Tab::Consultants => "consultants",
            Tab::Improvements => "improvements",
            Tab::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Backend rows (field names match the hosted store / webhook payloads)
// =============================================================================

/// A row of `novos_leads`. Read-only projection — leads are created by
/// upstream automation, never from this dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub qualificacao: Option<String>,
    #[serde(default)]
    pub resumo_conversa: Option<String>,
    #[serde(default)]
    pub etapa: Option<i64>,
    #[serde(default)]
    pub timeout: Option<String>,
}

/// A consultant-assignment row as returned by the roster webhooks.
/// `data` is a calendar date in `YYYY-MM-DD` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultantLead {
    pub id: i64,
    #[serde(default)]
    pub consultor: Option<String>,
    #[serde(default)]
    pub telefone_do_lead: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

/// A row of `system_logs`. Append-only; written by the action logger and
/// read in bulk by the admin view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub action: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Per-tenant feature toggles, keyed by username. A username with no row
/// is treated as fully enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySettings {
    pub username: String,
    pub is_active: bool,
    pub module_consultants: bool,
    pub module_improvements: bool,
}

impl CompanySettings {
    /// The default-allow settings used when no row exists for a username.
    pub fn default_for(username: &str) -> Self {
        Self {
            username: username.to_string(),
            is_active: true,
            module_consultants: true,
            module_improvements: true,
        }
    }
}

// =============================================================================
// Derived / IPC-only types
// =============================================================================

/// Inclusive calendar-date bounds, `YYYY-MM-DD`. Empty strings mean unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

impl DateFilter {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// Headline numbers above the leads table. Recomputed on every fetch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: usize,
    pub leads_today: usize,
    pub leads_per_consultant: u64,
}

/// Headline numbers above the consultant-leads table.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultantStats {
    pub total_sent: usize,
    pub sent_today: usize,
    pub active_consultants: usize,
}

/// An improvement request as filled in by the user. The submission
/// timestamp is added by the gateway at send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementRequest {
    pub solicitante: String,
    pub tipo: String,
    pub descricao: String,
    pub processos_manuais: String,
    pub prioridade: String,
}
