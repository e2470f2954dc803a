//! Periodic purge of expired challenges and idle per-caller state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::AuthFlow;

/// What a cleanup cycle removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Challenges past their deadline.
    pub expired_challenges: usize,
    /// Caller gates nobody was using.
    pub idle_gates: usize,
    /// Empty store slots past the marker retention.
    pub stale_markers: usize,
}

impl CleanupReport {
    /// Total entries removed.
    pub fn total(&self) -> usize {
        self.expired_challenges + self.idle_gates + self.stale_markers
    }
}

impl AuthFlow {
    /// Runs one cleanup cycle. Credentials of purged challenges are revoked.
    pub async fn run_cleanup(&self) -> CleanupReport {
        let now = Instant::now();
        let mut purged = Vec::new();
        self.pending.retain(|caller, challenge| {
            if !challenge.is_expired() {
                return true;
            }
            purged.push((caller.clone(), challenge.session.credential.clone()));
            false
        });
        let expired_challenges = purged.len();
        for (caller, _) in &purged {
            self.expired.insert(caller.clone(), now);
        }
        self.expired
            .retain(|_, at| now.duration_since(*at) < self.config.marker_retention);

        // A gate is idle when only the map holds it and nothing is parked
        // behind it.
        let before = self.gates.len();
        self.gates.retain(|caller, gate| {
            Arc::strong_count(gate) > 1
                || gate.lock.try_lock().is_err()
                || self.pending.contains_key(caller)
        });
        let idle_gates = before.saturating_sub(self.gates.len());

        let stale_markers = self.store.purge_idle(self.config.marker_retention);

        for (caller, credential) in purged {
            self.revoke(&caller, [credential]).await;
        }

        let report = CleanupReport {
            expired_challenges,
            idle_gates,
            stale_markers,
        };
        if report.total() > 0 {
            info!(
                expired_challenges,
                idle_gates, stale_markers, "Auth state cleanup completed"
            );
        }
        report
    }

    /// Runs [`run_cleanup`](Self::run_cleanup) every `cleanup_interval`
    /// until shutdown.
    pub fn spawn_cleanup(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.cleanup_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("Auth cleanup task shutting down");
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        self.run_cleanup().await;
                    }
                }
            }
        })
    }
}
