//! Listener registry for session events.
//!
//! Push-based: consumers register callbacks per event kind and are invoked
//! synchronously, in registration order, when events arrive. Duplicates are
//! permitted. Dispatch iterates over a snapshot of the callback list, so a
//! callback may re-enter the registry (or close the session) without
//! corrupting the iteration, and a panicking callback is isolated from the
//! rest.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::events::{EventKind, SessionEvent};

/// Handle returned by [`ListenerRegistry::add`]; removing by handle removes
/// exactly that registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

type Callback = Arc<dyn Fn(&SessionEvent) + Send + Sync + 'static>;

struct Entry {
    id: ListenerId,
    callback: Callback,
}

/// Event kind → ordered callback list.
#[derive(Clone, Default)]
pub(crate) struct ListenerRegistry {
    inner: Arc<Mutex<HashMap<EventKind, Vec<Entry>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &self,
        kind: EventKind,
        callback: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entry(kind).or_default().push(Entry {
            id,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove one registration by handle. Returns whether it was present.
    pub fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entries) = inner.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Remove every registration for a kind.
    pub fn remove_all(&self, kind: EventKind) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.remove(&kind);
    }

    /// Invoke every listener registered for the event's kind, in registration
    /// order. A panicking listener is caught and logged; delivery continues.
    pub fn dispatch(&self, event: &SessionEvent) {
        let snapshot: Vec<(ListenerId, Callback)> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            match inner.get(&event.kind()) {
                Some(entries) => entries
                    .iter()
                    .map(|entry| (entry.id, Arc::clone(&entry.callback)))
                    .collect(),
                None => return,
            }
        };

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| (callback.as_ref())(event))).is_err() {
                tracing::error!(
                    kind = ?event.kind(),
                    listener = %id,
                    "listener panicked during dispatch; continuing with remaining listeners"
                );
            }
        }
    }

    #[cfg(test)]
    pub fn count(&self, kind: EventKind) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
