//! Applying provider-pushed session changes.

use std::sync::Arc;

use caregate_core::events::ClearReason;
use caregate_entity::session::Session;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::provider::{SessionChange, SessionNotification};

use super::AuthFlow;

/// What a notification did to the caller's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The store was updated.
    Applied,
    /// The notification was not newer than the last applied write.
    Stale,
    /// An explicit sign-in is waiting for its second factor.
    ChallengePending,
    /// The profile could not be fetched; nothing changed.
    ProfileUnavailable,
    /// The refreshed identity needs a second factor; the session was cleared.
    ReverificationRequired,
}

impl AuthFlow {
    /// Applies one provider notification under the caller's gate.
    pub async fn handle_notification(&self, notification: SessionNotification) -> ReconcileOutcome {
        let SessionNotification {
            caller,
            issued_at,
            change,
        } = notification;

        let gate = self.gate(&caller);
        let _serial = gate.lock.lock().await;

        if self.has_live_challenge(&caller) {
            debug!(caller = %caller, "Notification ignored while challenge pending");
            return ReconcileOutcome::ChallengePending;
        }
        if self
            .store
            .reconciled_at(&caller)
            .is_some_and(|marker| issued_at <= marker)
        {
            debug!(caller = %caller, %issued_at, "Stale notification ignored");
            return ReconcileOutcome::Stale;
        }

        match change {
            SessionChange::SignedOut => {
                match self
                    .store
                    .clear_if_newer(&caller, ClearReason::ProviderSignedOut, issued_at)
                {
                    Some(_) => ReconcileOutcome::Applied,
                    None => ReconcileOutcome::Stale,
                }
            }
            SessionChange::Refreshed {
                user_id,
                email,
                credential,
            } => {
                let profile = match self.bounded(self.provider.fetch_profile(&user_id)).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!(caller = %caller, user_id = %user_id, error = %e, "Profile fetch failed during reconciliation");
                        return ReconcileOutcome::ProfileUnavailable;
                    }
                };

                let session = match self.store.current(&caller) {
                    Some(mut current) if current.user_id == user_id => {
                        current.refresh(credential, profile);
                        current
                    }
                    _ if profile.mfa_enrolled => {
                        info!(caller = %caller, user_id = %user_id, "Refreshed identity requires explicit sign-in");
                        self.store.clear_if_newer(
                            &caller,
                            ClearReason::ReverificationRequired,
                            issued_at,
                        );
                        return ReconcileOutcome::ReverificationRequired;
                    }
                    _ => Session::from_profile(user_id, email, credential, profile),
                };

                match self.store.hydrate_if_newer(&caller, session, issued_at) {
                    Some(_) => ReconcileOutcome::Applied,
                    None => ReconcileOutcome::Stale,
                }
            }
        }
    }

    /// Feeds the provider's change stream into
    /// [`handle_notification`](Self::handle_notification) until shutdown.
    ///
    /// Each notification runs in its own task, so a caller whose gate is
    /// held does not delay notifications for other callers.
    pub fn spawn_reconciler(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let mut changes = self.provider.subscribe_session_changes();

        tokio::spawn(async move {
            info!("Session reconciler started");
            let mut in_flight = JoinSet::new();
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            warn!(error = %e, "Notification task failed");
                        }
                    }
                    received = changes.recv() => match received {
                        Ok(notification) => {
                            let flow = Arc::clone(&self);
                            in_flight.spawn(async move {
                                let caller = notification.caller.clone();
                                let outcome = flow.handle_notification(notification).await;
                                debug!(caller = %caller, outcome = ?outcome, "Notification handled");
                            });
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session reconciler lagged; notifications dropped");
                        }
                        Err(RecvError::Closed) => {
                            warn!("Provider change stream closed");
                            break;
                        }
                    },
                }
            }
            in_flight.abort_all();
            while in_flight.join_next().await.is_some() {}
            info!("Session reconciler stopped");
        })
    }
}
