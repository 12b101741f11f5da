//! Automatize — desktop runtime for the lead operations dashboard.
//!
//! The webview renders; this crate owns everything else: authentication,
//! session persistence, the hosted-store and webhook gateways, per-tenant
//! access gating, usage logging and the admin analytics.

pub mod activity;
pub mod auth;
pub mod commands;
pub mod error;
pub mod gateway;
pub mod listing;
pub mod permissions;
pub mod services;
pub mod session;
pub mod state;
pub mod types;

use std::sync::Arc;

use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            use tauri::Manager;
            app.manage(Arc::new(AppState::new()));
            log::info!("Automatize started");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::login,
            commands::restore_session,
            commands::logout,
            commands::select_tab,
            commands::check_access,
            commands::get_dashboard_data,
            commands::set_leads_search,
            commands::select_leads_sort,
            commands::set_leads_page,
            commands::get_consultant_data,
            commands::set_consultant_search,
            commands::select_consultant_sort,
            commands::set_consultant_page,
            commands::set_consultant_filter,
            commands::set_active_consultants_override,
            commands::submit_improvement,
            commands::get_usage_overview,
            commands::get_tenant_activity,
            commands::get_tenant_options,
            commands::get_company_settings,
            commands::save_company_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
