//! Business logic behind the Tauri commands. One module per view:
//! leads dashboard, consultant distribution, improvement requests and
//! the admin usage panel.

pub mod admin;
pub mod consultants;
pub mod improvements;
pub mod leads;
