//! Per-tenant access gating.
//!
//! Non-admin sessions are checked against their `company_settings` row on
//! every view change. A missing row means fully enabled (default-allow).
//! A settings fetch error is swallowed and treated the same way — an
//! availability-over-strictness choice; the failure is logged so the
//! fail-open path stays visible.

use serde::Serialize;

use crate::error::GatewayError;
use crate::gateway::supabase::SupabaseClient;
use crate::types::{AccountRole, CompanySettings, Session, Tab};

/// What the view layer must do after a permission check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum PermissionOutcome {
    /// Stay on the requested view.
    Allow,
    /// The requested view's module is disabled; go to the default view.
    Redirect { tab: Tab },
    /// Access revoked; the session must be terminated.
    ForceLogout,
}

/// Pure resolution of settings + requested view into an outcome.
pub fn resolve(settings: &CompanySettings, tab: Tab) -> PermissionOutcome {
    if !settings.is_active {
        return PermissionOutcome::ForceLogout;
    }
    match tab {
        Tab::Consultants if !settings.module_consultants => {
            PermissionOutcome::Redirect { tab: Tab::Leads }
        }
        Tab::Improvements if !settings.module_improvements => {
            PermissionOutcome::Redirect { tab: Tab::Leads }
        }
        _ => PermissionOutcome::Allow,
    }
}

/// Settings for a username, with the default-allow fallback applied to
/// both "no row" and "fetch failed".
pub async fn effective_settings(client: &SupabaseClient, username: &str) -> CompanySettings {
    match client.fetch_company_settings(username).await {
        Ok(Some(settings)) => settings,
        Ok(None) => CompanySettings::default_for(username),
        Err(e) => {
            // Fail-open by design; see the module header.
            log::warn!("Settings fetch failed for {} — defaulting to allow: {}", username, e);
            CompanySettings::default_for(username)
        }
    }
}

/// Full check for a session and the view it is on. Admin accounts bypass
/// tenant gating; non-admin accounts never see the admin view.
pub async fn check_access(
    client: Result<&SupabaseClient, &GatewayError>,
    session: &Session,
    tab: Tab,
) -> PermissionOutcome {
    if session.role == AccountRole::Admin {
        return PermissionOutcome::Allow;
    }
    if tab == Tab::Admin {
        return PermissionOutcome::Redirect { tab: Tab::Leads };
    }

    let settings = match client {
        Ok(client) => effective_settings(client, &session.username).await,
        Err(e) => {
            log::warn!("No gateway for permission check — defaulting to allow: {}", e);
            CompanySettings::default_for(&session.username)
        }
    };
    resolve(&settings, tab)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(active: bool, consultants: bool, improvements: bool) -> CompanySettings {
        CompanySettings {
            username: "Pulseenergy".to_string(),
            is_active: active,
            module_consultants: consultants,
            module_improvements: improvements,
        }
    }

    #[test]
    fn inactive_tenant_is_logged_out_regardless_of_view() {
        for tab in [Tab::Leads, Tab::Consultants, Tab::Improvements] {
            assert_eq!(
                resolve(&settings(false, true, true), tab),
                PermissionOutcome::ForceLogout
            );
        }
    }

    #[test]
    fn disabled_consultants_module_redirects_from_consultants_view() {
        assert_eq!(
            resolve(&settings(true, false, true), Tab::Consultants),
            PermissionOutcome::Redirect { tab: Tab::Leads }
        );
        // Other views are unaffected.
        assert_eq!(
            resolve(&settings(true, false, true), Tab::Leads),
            PermissionOutcome::Allow
        );
        assert_eq!(
            resolve(&settings(true, false, true), Tab::Improvements),
            PermissionOutcome::Allow
        );
    }

    #[test]
    fn disabled_improvements_module_redirects_from_improvements_view() {
        assert_eq!(
            resolve(&settings(true, true, false), Tab::Improvements),
            PermissionOutcome::Redirect { tab: Tab::Leads }
        );
    }

    #[test]
    fn fully_enabled_settings_allow_everything_but_admin() {
        for tab in [Tab::Leads, Tab::Consultants, Tab::Improvements] {
            assert_eq!(resolve(&settings(true, true, true), tab), PermissionOutcome::Allow);
        }
    }

    #[test]
    fn default_settings_are_fully_enabled() {
        let defaults = CompanySettings::default_for("anyone");
        assert!(defaults.is_active);
        assert!(defaults.module_consultants);
        assert!(defaults.module_improvements);
    }
}
