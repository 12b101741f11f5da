//! Best-effort action logging.
//!
//! Login, logout and tab-change events are appended to `system_logs` as
//! fire-and-forget writes: the calling flow never blocks on, and never
//! fails because of, a logging error. Failures emit a local warning and
//! nothing else.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;

use crate::error::GatewayError;
use crate::gateway::supabase::{LogInsert, SupabaseClient};

/// A tab must stay selected this long before its change is logged.
pub const TAB_LOG_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogAction {
    Login,
    Logout,
    TabChange,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Login => "login",
            LogAction::Logout => "logout",
            LogAction::TabChange => "tab_change",
        }
    }
}

/// Fire-and-forget append of one log row. A missing/misconfigured
/// gateway is swallowed exactly like a network failure.
pub fn record(
    client: Result<SupabaseClient, GatewayError>,
    username: String,
    action: LogAction,
    details: Option<String>,
) {
    tokio::spawn(async move {
        let client = match client {
            Ok(client) => client,
            Err(e) => {
                log::warn!("Could not log action {}: {}", action.as_str(), e);
                return;
            }
        };
        let entry = LogInsert {
            username,
            action: action.as_str().to_string(),
            details,
            created_at: Utc::now(),
        };
        if let Err(e) = client.insert_log(&entry).await {
            log::warn!("Could not log action {}: {}", action.as_str(), e);
        }
    });
}

/// Debouncer for tab-change logs: a newer selection cancels the pending
/// write, so rapid navigation produces at most one row per settle.
#[derive(Default)]
pub struct TabLogDebouncer {
    pending: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TabLogDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` unless superseded or cancelled first.
    pub fn schedule_after<F>(&self, delay: Duration, action: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        if let Ok(mut guard) = self.pending.lock() {
            if let Some(previous) = guard.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Drop any pending write (logout, forced logout).
    pub fn cancel(&self) {
        if let Ok(mut guard) = self.pending.lock() {
            if let Some(previous) = guard.take() {
                previous.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn superseding_event_cancels_the_pending_write() {
        let debouncer = TabLogDebouncer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let first = fired.clone();
        debouncer.schedule_after(Duration::from_millis(30), async move {
            first.fetch_add(1, Ordering::SeqCst);
        });
        // Supersede well inside the first delay.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = fired.clone();
        debouncer.schedule_after(Duration::from_millis(30), async move {
            second.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_write() {
        let debouncer = TabLogDebouncer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        debouncer.schedule_after(Duration::from_millis(20), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn settled_selection_is_logged_once() {
        let debouncer = TabLogDebouncer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        debouncer.schedule_after(Duration::from_millis(10), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
