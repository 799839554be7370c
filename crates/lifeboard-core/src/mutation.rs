// ── Write operation binding ──
//
// Nothing happens until `mutate(variables)` is called. The endpoint path
// may depend on the variables (`habits/{id}`); the variables are also the
// JSON body. Overlapping calls are allowed and the last one to settle
// owns the final state.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use lifeboard_api::{ApiClient, Endpoint, Method, RequestOptions};

use crate::state::{Binding, MutationState, QueryState};

type SuccessFn<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Side-effect callbacks run when a mutation settles on a live binding.
pub struct MutationOptions<T> {
    on_success: Option<SuccessFn<T>>,
    on_error: Option<ErrorFn>,
}

impl<T> Default for MutationOptions<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> MutationOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the decoded response before `mutate` returns.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Called with the error message before `mutate` returns.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }
}

/// A write endpoint bound to observable state.
pub struct Mutation<V, T> {
    shared: Arc<MutationShared<V, T>>,
}

struct MutationShared<V, T> {
    client: ApiClient,
    endpoint: Endpoint<V>,
    options: MutationOptions<T>,
    binding: Binding<T>,
}

impl<V, T> MutationShared<V, T>
where
    V: Serialize + Send + Sync + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(&self, variables: V) -> Option<T> {
        if !self.binding.write(QueryState::start_loading) {
            return None;
        }

        let path = self.endpoint.resolve(&variables);
        let method = self.endpoint.http_method().clone();
        let options = RequestOptions::default().auth(self.endpoint.requires_auth());
        let body = (method != Method::DELETE).then_some(&variables);

        match self.client.request::<T, V>(method, &path, body, &options).await {
            Ok(data) => {
                if self.binding.write(|s| s.succeed(data.clone())) {
                    if let Some(on_success) = &self.options.on_success {
                        on_success(&data);
                    }
                }
                Some(data)
            }
            Err(err) => {
                let message = err.to_string();
                debug!(%path, error = %message, "mutation failed");
                if self.binding.write(|s| s.fail(message.clone())) {
                    if let Some(on_error) = &self.options.on_error {
                        on_error(&message);
                    }
                }
                None
            }
        }
    }
}

impl<V, T> Mutation<V, T>
where
    V: Serialize + Send + Sync + 'static,
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(client: &ApiClient, endpoint: Endpoint<V>, options: MutationOptions<T>) -> Self {
        Self {
            shared: Arc::new(MutationShared {
                client: client.clone(),
                endpoint,
                options,
                binding: Binding::new(QueryState::default()),
            }),
        }
    }

    /// Run the mutation. Returns the response, or `None` on failure (the
    /// message lands in `error` and is passed to `on_error`).
    pub async fn mutate(&self, variables: V) -> Option<T> {
        self.shared.run(variables).await
    }

    /// Run the mutation on a detached task.
    ///
    /// If this `Mutation` is dropped first, the request still completes but
    /// neither the state nor the callbacks see its result.
    pub fn spawn_mutate(&self, variables: V) -> JoinHandle<Option<T>> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move { shared.run(variables).await })
    }

    /// Back to idle with no data.
    pub fn reset(&self) {
        self.shared.binding.write(|s| *s = QueryState::default());
    }

    pub fn state(&self) -> MutationState<T> {
        self.shared.binding.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState<T>> {
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

    pub fn endpoint(&self) -> &Endpoint<V> {
        &self.shared.endpoint
    }
}

impl<V, T> Drop for Mutation<V, T> {
    fn drop(&mut self) {
        self.shared.binding.teardown();
    }
}
