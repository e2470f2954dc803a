//! In-memory per-caller session store.

use std::sync::Arc;
use std::time::Duration;

use caregate_core::events::{ClearReason, SessionEvent};
use caregate_core::types::CallerId;
use caregate_entity::session::Session;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use super::subscription::{ListenerRegistry, SessionListener, Subscription};

/// One caller's state. The slot outlives its session so that the
/// reconciliation marker keeps rejecting stale notifications after a clear.
#[derive(Debug, Default)]
struct Slot {
    session: Option<Session>,
    revision: u64,
    reconciled_at: Option<DateTime<Utc>>,
}

impl Slot {
    fn is_stale(&self, stamp: DateTime<Utc>) -> bool {
        self.reconciled_at.is_some_and(|marker| stamp <= marker)
    }

    /// Moves the marker forward to `stamp`, or one tick past the current
    /// marker when `stamp` is not ahead of it. The marker never goes back.
    fn advance_marker(&mut self, stamp: DateTime<Utc>) {
        let next = match self.reconciled_at {
            Some(marker) if stamp <= marker => marker + TimeDelta::nanoseconds(1),
            _ => stamp,
        };
        self.reconciled_at = Some(next);
    }

    fn store(&mut self, caller: &CallerId, session: Session, stamp: DateTime<Utc>) -> SessionEvent {
        self.revision += 1;
        self.advance_marker(stamp);
        let event = SessionEvent::Hydrated {
            caller: caller.clone(),
            session_id: session.id,
            user_id: session.user_id,
            revision: self.revision,
            usable: session.is_usable(),
            at: Utc::now(),
        };
        self.session = Some(session);
        event
    }

    fn remove(
        &mut self,
        caller: &CallerId,
        reason: ClearReason,
        stamp: DateTime<Utc>,
    ) -> Option<SessionEvent> {
        self.revision += 1;
        self.advance_marker(stamp);
        self.session.take().map(|session| SessionEvent::Cleared {
            caller: caller.clone(),
            user_id: session.user_id,
            revision: self.revision,
            reason,
            at: Utc::now(),
        })
    }
}

/// Holds the current session of every caller and announces each change.
///
/// Reads never wait on writers of other callers. Listeners run after the
/// slot lock is released.
pub struct SessionStore {
    slots: DashMap<CallerId, Slot>,
    listeners: Arc<ListenerRegistry>,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            listeners: Arc::new(ListenerRegistry::default()),
        }
    }

    /// Snapshot of the caller's current session.
    pub fn current(&self, caller: &CallerId) -> Option<Session> {
        self.slots.get(caller).and_then(|slot| slot.session.clone())
    }

    /// Stores a fully built session, replacing any previous one.
    ///
    /// Returns the caller's new revision.
    pub fn hydrate(&self, caller: &CallerId, session: Session) -> u64 {
        let event = self
            .slots
            .entry(caller.clone())
            .or_default()
            .store(caller, session, Utc::now());
        let revision = event.revision();

        info!(caller = %caller, revision, "Session hydrated");
        self.listeners.dispatch(&event);
        revision
    }

    /// Removes the caller's session and advances its marker.
    ///
    /// Listeners are only notified when a session was actually removed.
    pub fn clear(&self, caller: &CallerId, reason: ClearReason) -> u64 {
        let (revision, event) = {
            let mut slot = self.slots.entry(caller.clone()).or_default();
            let event = slot.remove(caller, reason, Utc::now());
            (slot.revision, event)
        };

        if let Some(event) = event {
            info!(caller = %caller, revision, reason = ?reason, "Session cleared");
            self.listeners.dispatch(&event);
        }
        revision
    }

    /// Stores `session` only if `stamp` is newer than the caller's marker.
    ///
    /// Returns the new revision, or `None` when the write was stale.
    pub fn hydrate_if_newer(
        &self,
        caller: &CallerId,
        session: Session,
        stamp: DateTime<Utc>,
    ) -> Option<u64> {
        let event = {
            let mut slot = self.slots.entry(caller.clone()).or_default();
            if slot.is_stale(stamp) {
                debug!(caller = %caller, "Ignoring stale hydrate");
                return None;
            }
            slot.store(caller, session, stamp)
        };
        let revision = event.revision();

        info!(caller = %caller, revision, "Session reconciled");
        self.listeners.dispatch(&event);
        Some(revision)
    }

    /// Clears the caller's session only if `stamp` is newer than its marker.
    ///
    /// Returns the new revision, or `None` when the write was stale.
    pub fn clear_if_newer(
        &self,
        caller: &CallerId,
        reason: ClearReason,
        stamp: DateTime<Utc>,
    ) -> Option<u64> {
        let (revision, event) = {
            let mut slot = self.slots.entry(caller.clone()).or_default();
            if slot.is_stale(stamp) {
                debug!(caller = %caller, "Ignoring stale clear");
                return None;
            }
            let event = slot.remove(caller, reason, stamp);
            (slot.revision, event)
        };

        if let Some(event) = event {
            info!(caller = %caller, revision, reason = ?reason, "Session cleared by reconciliation");
            self.listeners.dispatch(&event);
        }
        Some(revision)
    }

    /// The instant of the last write applied for the caller.
    pub fn reconciled_at(&self, caller: &CallerId) -> Option<DateTime<Utc>> {
        self.slots.get(caller).and_then(|slot| slot.reconciled_at)
    }

    /// The caller's current revision (0 if never written).
    pub fn revision(&self, caller: &CallerId) -> u64 {
        self.slots.get(caller).map_or(0, |slot| slot.revision)
    }

    /// Drops empty slots whose marker is older than `retention`.
    ///
    /// Returns how many slots were removed.
    pub fn purge_idle(&self, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let horizon = Utc::now().checked_sub_signed(retention);
        let before = self.slots.len();

        self.slots.retain(|_, slot| {
            if slot.session.is_some() {
                return true;
            }
            match (slot.reconciled_at, horizon) {
                (Some(marker), Some(horizon)) => marker > horizon,
                (None, _) => false,
                (Some(_), None) => true,
            }
        });
        before.saturating_sub(self.slots.len())
    }

    /// Number of callers with a slot, including empty ones.
    pub fn tracked_callers(&self) -> usize {
        self.slots.len()
    }

    /// Registers a listener for every subsequent session change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let listener: SessionListener = Arc::new(listener);
        self.listeners.add(listener)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("callers", &self.slots.len())
            .finish()
    }
}
