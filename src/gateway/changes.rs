//! Lead change feed.
//!
//! The hosted store pushes no events to this client, so the feed is a
//! background watcher in the same shape as the app's other pollers: it
//! digests the lead table on an interval and emits a `leads-changed`
//! event to the webview when the digest moves. The view reacts by
//! re-running its full fetch; no incremental deltas are applied.
//!
//! Lifetime is scoped to "authenticated and leads view active" — the
//! feed is started and stopped by the tab/session commands and must
//! never outlive logout.

use std::time::Duration;

use tauri::Emitter;
use tokio::sync::watch;

use crate::gateway::supabase::SupabaseClient;

/// Event name the webview listens on.
pub const LEADS_CHANGED_EVENT: &str = "leads-changed";

/// Handle for a running feed. Dropping without `stop` leaks the task, so
/// the owner (AppState) calls `stop` on logout and on leaving the view.
pub struct LeadChangeFeed {
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl LeadChangeFeed {
    /// Spawn the watcher. The first poll only primes the digest; events
    /// fire from the second poll onward.
    pub fn start(client: SupabaseClient, app: tauri::AppHandle, interval: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut last_digest: Option<String> = None;
            loop {
                match client.leads_digest().await {
                    Ok(digest) => {
                        if let Some(previous) = &last_digest {
                            if *previous != digest {
                                log::debug!("Lead table changed — notifying view");
                                if let Err(e) = app.emit(LEADS_CHANGED_EVENT, ()) {
                                    log::warn!("Could not emit {}: {}", LEADS_CHANGED_EVENT, e);
                                }
                            }
                        }
                        last_digest = Some(digest);
                    }
                    // Poll failures are silent to the user; the next
                    // interval retries.
                    Err(e) => log::debug!("Lead change poll failed: {}", e),
                }

                tokio::select! {
                    _ = rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Tear the watcher down.
    pub fn stop(self) {
        let _ = self.shutdown.send(true);
        self.handle.abort();
    }
}
