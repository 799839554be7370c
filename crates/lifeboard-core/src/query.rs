// ── Read query binding ──
//
// Fetches one endpoint on construction or on demand and publishes
// `{data, error, status}` through a watch channel. Dropping the `Query`
// tears the binding down: responses that arrive afterward are discarded.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use lifeboard_api::{ApiClient, RequestOptions};

use crate::state::{Binding, QueryState};

/// Construction options for a [`Query`].
#[derive(Debug, Clone)]
pub struct QueryOptions<T> {
    /// Start fetching as soon as the query is created (default `true`).
    pub immediate: bool,
    /// Whether a 401 goes through the refresh flow (default `true`).
    pub auth: bool,
    /// Data visible before the first fetch settles, and after `reset()`.
    pub initial_data: Option<T>,
}

impl<T> Default for QueryOptions<T> {
    fn default() -> Self {
        Self {
            immediate: true,
            auth: true,
            initial_data: None,
        }
    }
}

impl<T> QueryOptions<T> {
    /// Options for a query that waits for an explicit `refetch()`.
    pub fn lazy() -> Self {
        Self {
            immediate: false,
            ..Self::default()
        }
    }
}

/// A GET endpoint bound to observable state.
pub struct Query<T> {
    shared: Arc<QueryShared<T>>,
}

struct QueryShared<T> {
    client: ApiClient,
    path: String,
    options: RequestOptions,
    initial: QueryState<T>,
    binding: Binding<T>,
}

impl<T> QueryShared<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn fetch(&self) -> Option<T> {
        if !self.binding.write(QueryState::start_loading) {
            return None;
        }

        match self.client.get_with::<T>(&self.path, &self.options).await {
            Ok(data) => {
                self.binding.write(|s| s.succeed(data.clone()));
                Some(data)
            }
            Err(err) => {
                debug!(path = %self.path, error = %err, "query failed");
                self.binding.write(|s| s.fail(err.to_string()));
                None
            }
        }
    }
}

impl<T> Query<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind `path` (relative to the API base) to a new query.
    ///
    /// With `options.immediate` the first fetch is spawned right away, so
    /// this must then be called from within a Tokio runtime.
    pub fn new(client: &ApiClient, path: impl Into<String>, options: QueryOptions<T>) -> Self {
        let initial = QueryState::idle(options.initial_data);
        let query = Self {
            shared: Arc::new(QueryShared {
                client: client.clone(),
                path: path.into(),
                options: RequestOptions::default().auth(options.auth),
                binding: Binding::new(initial.clone()),
                initial,
            }),
        };

        if options.immediate {
            drop(query.spawn_refetch());
        }

        query
    }

    /// Fetch again. Returns the new value, or `None` on failure (the
    /// failure itself lands in `error`).
    pub async fn refetch(&self) -> Option<T> {
        self.shared.fetch().await
    }

    /// Fetch again on a detached task.
    ///
    /// The task keeps running if this `Query` is dropped, but its result is
    /// then not written to state.
    pub fn spawn_refetch(&self) -> JoinHandle<Option<T>> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.fetch().await })
    }

    /// Return to the initial state without touching the network.
    pub fn reset(&self) {
        let initial = self.shared.initial.clone();
        self.shared.binding.write(move |s| *s = initial);
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState<T> {
        self.shared.binding.snapshot()
    }

    /// Watch the state for changes.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.shared.binding.subscribe()
    }

    pub fn data(&self) -> Option<T> {
        self.shared.binding.inspect(|s| s.data.clone())
    }

    pub fn error(&self) -> Option<String> {
        self.shared.binding.inspect(|s| s.error.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.shared.binding.inspect(QueryState::is_loading)
    }

    pub fn is_success(&self) -> bool {
        self.shared.binding.inspect(QueryState::is_success)
    }

    pub fn is_error(&self) -> bool {
        self.shared.binding.inspect(QueryState::is_error)
    }

    pub fn path(&self) -> &str {
        &self.shared.path
    }
}

impl<T> Drop for Query<T> {
    fn drop(&mut self) {
        self.shared.binding.teardown();
    }
}
