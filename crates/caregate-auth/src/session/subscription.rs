//! Listener registry for session changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use caregate_core::events::SessionEvent;

/// Callback invoked after every session write.
pub type SessionListener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<(u64, SessionListener)>>,
}

impl ListenerRegistry {
    pub(crate) fn add(self: &Arc<Self>, listener: SessionListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        Subscription {
            id,
            registry: Some(Arc::downgrade(self)),
        }
    }

    fn remove(&self, id: u64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(entry_id, _)| *entry_id != id);
    }

    /// Calls every listener registered at the moment of the call. The lock
    /// is released before any listener runs.
    pub(crate) fn dispatch(&self, event: &SessionEvent) {
        let snapshot: Vec<SessionListener> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Handle returned by [`SessionStore::subscribe`](super::SessionStore::subscribe).
///
/// The listener stays registered until the handle is dropped or
/// [`unsubscribe`](Self::unsubscribe) is called.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Option<Weak<ListenerRegistry>>,
}

impl Subscription {
    /// Stops delivery to the listener.
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
