// ── Observable request state ──
//
// The `{data, error, status}` triple shared by queries and mutations, and
// the binding that owns it: a watch channel plus the liveness flag that
// stops late responses from writing into a torn-down binding.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use strum::{AsRefStr, Display};
use tokio::sync::watch;
use tracing::trace;

/// Lifecycle of one query or mutation binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Current value of a query or mutation.
///
/// After a settled call exactly one of `data` / `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryState<T> {
    pub data: Option<T>,
    pub error: Option<String>,
    pub status: Status,
}

/// Mutations expose the same shape; only what drives the transitions differs.
pub type MutationState<T> = QueryState<T>;

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::idle(None)
    }
}

impl<T> QueryState<T> {
    /// The state before any request, optionally seeded with data.
    pub fn idle(initial: Option<T>) -> Self {
        Self {
            data: initial,
            error: None,
            status: Status::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == Status::Idle
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Keeps previous data visible while the request runs.
    pub(crate) fn start_loading(&mut self) {
        self.status = Status::Loading;
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, data: T) {
        self.data = Some(data);
        self.error = None;
        self.status = Status::Success;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.data = None;
        self.error = Some(message);
        self.status = Status::Error;
    }
}

/// State owned by one query/mutation binding.
///
/// Shared with in-flight tasks through an `Arc`; the owning handle clears
/// `live` on drop and every deferred write checks it first.
pub(crate) struct Binding<T> {
    state: watch::Sender<QueryState<T>>,
    live: AtomicBool,
}

impl<T> Binding<T> {
    pub(crate) fn new(initial: QueryState<T>) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            live: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Flipped under the channel's write lock, so no write straddles it.
    pub(crate) fn teardown(&self) {
        self.state.send_if_modified(|_| {
            self.live.store(false, Ordering::Release);
            false
        });
    }

    /// Apply `update` if the binding is still live. Returns whether it ran.
    pub(crate) fn write(&self, update: impl FnOnce(&mut QueryState<T>)) -> bool {
        self.state.send_if_modified(|state| {
            if !self.is_live() {
                trace!("binding torn down, discarding state update");
                return false;
            }
            update(state);
            true
        })
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.state.subscribe()
    }

    /// Read the current state without cloning it.
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&QueryState<T>) -> R) -> R {
        f(&self.state.borrow())
    }
}

impl<T: Clone> Binding<T> {
    pub(crate) fn snapshot(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_state_holds_exactly_one_outcome() {
        let mut state = QueryState::idle(Some(1));
        state.start_loading();
        assert!(state.is_loading());
        assert_eq!(state.data, Some(1));

        state.fail("boom".into());
        assert!(state.is_error());
        assert_eq!(state.data, None);
        assert_eq!(state.error.as_deref(), Some("boom"));

        state.start_loading();
        state.succeed(2);
        assert!(state.is_success());
        assert_eq!(state.data, Some(2));
        assert_eq!(state.error, None);
    }

    #[test]
    fn torn_down_binding_ignores_writes() {
        let binding = Binding::new(QueryState::<u32>::default());
        assert!(binding.write(QueryState::start_loading));

        binding.teardown();
        assert!(!binding.write(|s| s.succeed(7)));
        assert!(binding.snapshot().is_loading());
        assert_eq!(binding.snapshot().data, None);
    }

    #[test]
    fn no_write_lands_after_teardown_returns() {
        let binding = Binding::new(QueryState::<u64>::idle(Some(0)));
        let frozen = std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for n in 1..=10_000 {
                        binding.write(|s| s.succeed(n));
                    }
                });
            }
            std::thread::yield_now();
            binding.teardown();
            binding.snapshot()
        });

        assert!(!binding.is_live());
        assert_eq!(binding.snapshot(), frozen);
    }

    #[test]
    fn status_renders_lowercase() {
        assert_eq!(Status::Loading.to_string(), "loading");
        assert_eq!(Status::Error.as_ref(), "error");
    }
}
