//! Local session persistence.
//!
//! Exactly two client-asserted values survive a restart: the
//! authenticated flag and the username. There is no expiry and no
//! signature — trust is re-established by the permission resolver on the
//! next check cycle, not by the stored file.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk shape of ~/.automatize/session.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    authenticated: bool,
    username: String,
}

/// Reads and writes the persisted session file.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at ~/.automatize
    pub fn new() -> Result<Self, String> {
        let home = dirs::home_dir().ok_or("Could not find home directory")?;
        Ok(Self {
            dir: home.join(".automatize"),
        })
    }

    /// Store rooted at an explicit directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("session.json")
    }

    /// The persisted username, if an authenticated session exists.
    /// An unreadable or malformed file reads as "no session".
    pub fn load(&self) -> Option<String> {
        let content = fs::read_to_string(self.path()).ok()?;
        let file: SessionFile = serde_json::from_str(&content).ok()?;
        if file.authenticated && !file.username.is_empty() {
            Some(file.username)
        } else {
            None
        }
    }

    /// Persist an authenticated session.
    pub fn save(&self, username: &str) -> Result<(), String> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .map_err(|e| format!("Failed to create state dir: {}", e))?;
        }
        let file = SessionFile {
            authenticated: true,
            username: username.to_string(),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(self.path(), content).map_err(|e| format!("Write error: {}", e))
    }

    /// Remove the persisted session. Missing file is fine.
    pub fn clear(&self) {
        let _ = fs::remove_file(self.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trips_username() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_dir(dir.path().to_path_buf());

        store.save("Pulseenergy").expect("save");
        assert_eq!(store.load().as_deref(), Some("Pulseenergy"));
    }

    #[test]
    fn clear_removes_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_dir(dir.path().to_path_buf());

        store.save("Pulseenergy").expect("save");
        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn malformed_file_reads_as_no_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_dir(dir.path().to_path_buf());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("session.json"), "not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn unauthenticated_flag_reads_as_no_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::with_dir(dir.path().to_path_buf());

        fs::create_dir_all(dir.path()).unwrap();
        fs::write(
            dir.path().join("session.json"),
            r#"{"authenticated": false, "username": "Pulseenergy"}"#,
        )
        .unwrap();
        assert!(store.load().is_none());
    }
}
