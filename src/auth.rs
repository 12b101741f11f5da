//! Credential verification.
//!
//! The dashboard itself is credential-agnostic: it talks to an injected
//! `Authenticator`, and the production implementation checks the account
//! list from config.json. Passwords live there as SHA-256 digests, so a
//! config file in the wrong hands does not leak them directly.

use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::types::{AccountConfig, AccountRole, Session};

/// Maps a credential pair to a session, or rejects it.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError>;
}

/// Authenticator over the configured account list.
///
/// Username matching is trimmed and case-insensitive; the canonical
/// configured spelling is what enters the session (and the access logs).
pub struct ConfigAuthenticator {
    accounts: Vec<AccountConfig>,
}

impl ConfigAuthenticator {
    pub fn new(accounts: Vec<AccountConfig>) -> Self {
        Self { accounts }
    }

    /// Look up an account by username without checking a password. Used on
    /// session restore, where only the username was persisted.
    pub fn find_account(&self, username: &str) -> Option<&AccountConfig> {
        let wanted = username.trim().to_lowercase();
        self.accounts
            .iter()
            .find(|a| a.username.to_lowercase() == wanted)
    }

    /// Role of the configured account, if any.
    pub fn role_of(&self, username: &str) -> Option<AccountRole> {
        self.find_account(username).map(|a| a.role)
    }

    /// The single administrative username, if one is configured.
    pub fn admin_username(&self) -> Option<&str> {
        self.accounts
            .iter()
            .find(|a| a.role == AccountRole::Admin)
            .map(|a| a.username.as_str())
    }
}

/// Lowercase SHA-256 hex digest of a password.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

impl Authenticator for ConfigAuthenticator {
    fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if self.accounts.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let account = self
            .find_account(username)
            .ok_or(AuthError::InvalidCredentials)?;

        let digest = password_digest(password);
        if digest != account.password_sha256.to_lowercase() {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Session {
            username: account.username.clone(),
            role: account.role,
        })
    }
}
