// Unauthorized notification hub
//
// Decouples "the session is no longer valid" (observed by the transport)
// from "do something about it" (owned by whoever holds session state).
// The transport only ever calls `notify()`; listeners register here.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Opaque handle identifying one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Publish/subscribe hub for "you are logged out now".
///
/// Cheaply cloneable; clones share the listener registry and the
/// reentrancy guard. A burst of failures inside one guard window produces
/// a single round of callbacks.
#[derive(Clone)]
pub struct UnauthorizedSignal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    listeners: Mutex<IndexMap<ListenerId, Listener>>,
    next_id: AtomicU64,
    /// Notifications are suppressed until this instant.
    guard_until: Mutex<Option<Instant>>,
    window: Duration,
    fallback: Mutex<Listener>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn default_fallback() -> Listener {
    Arc::new(|| {
        warn!("session is no longer valid but no unauthorized listener is registered");
    })
}

impl UnauthorizedSignal {
    /// Create a hub whose guard suppresses repeat notifications for `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                listeners: Mutex::new(IndexMap::new()),
                next_id: AtomicU64::new(0),
                guard_until: Mutex::new(None),
                window,
                fallback: Mutex::new(default_fallback()),
            }),
        }
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.inner.listeners).insert(id, Arc::new(callback));
        trace!(?id, "unauthorized listener registered");
        Subscription {
            id,
            signal: Arc::downgrade(&self.inner),
        }
    }

    /// Replace the behavior used when `notify()` finds no listeners.
    pub fn set_fallback<F>(&self, fallback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.inner.fallback) = Arc::new(fallback);
    }

    /// Broadcast that the session is gone.
    ///
    /// Returns `false` when the call was swallowed by the reentrancy guard.
    /// Listeners run synchronously, in registration order, over a snapshot
    /// of the registry: they may subscribe or unsubscribe while running.
    pub fn notify(&self) -> bool {
        let now = Instant::now();
        {
            let mut guard = lock(&self.inner.guard_until);
            if guard.is_some_and(|until| now < until) {
                debug!("unauthorized notification suppressed (already notifying)");
                return false;
            }
            *guard = Some(now + self.inner.window);
        }

        let snapshot: Vec<Listener> = lock(&self.inner.listeners).values().cloned().collect();

        if snapshot.is_empty() {
            let fallback = Arc::clone(&lock(&self.inner.fallback));
            fallback();
            return true;
        }

        debug!(listeners = snapshot.len(), "notifying unauthorized listeners");
        for listener in snapshot {
            listener();
        }
        true
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// Whether a notification fired within the current guard window.
    pub fn is_guarded(&self) -> bool {
        lock(&self.inner.guard_until).is_some_and(|until| Instant::now() < until)
    }
}

impl fmt::Debug for UnauthorizedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnauthorizedSignal")
            .field("listeners", &self.listener_count())
            .field("window", &self.inner.window)
            .finish_non_exhaustive()
    }
}

/// Registration handle returned by [`UnauthorizedSignal::subscribe`].
///
/// Dropping it removes the callback.
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    signal: Weak<SignalInner>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the callback now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.signal.upgrade() {
            lock(&inner.listeners).shift_remove(&self.id);
            trace!(id = ?self.id, "unauthorized listener removed");
        }
    }
}
