//! Error types for remote operations.
//!
//! The failure taxonomy is deliberately small:
//! - Network/store failures on reads surface as a banner message.
//! - Failures on log writes are swallowed by the caller.
//! - Validation failures are caught before any network call.
//! No error here is ever fatal; every command converts these into a
//! display string or a tagged result variant.

use thiserror::Error;

/// Errors from the Supabase REST gateway and the webhook clients.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Caught locally, before any network round-trip.
    #[error("{0}")]
    Validation(String),
}

impl GatewayError {
    /// True when the request never left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

/// Authentication failures from the injected authenticator.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credenciais inválidas. Verifique usuário e senha.")]
    InvalidCredentials,

    #[error("No accounts configured. Add accounts to ~/.automatize/config.json")]
    NotConfigured,
}
