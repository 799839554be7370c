//! Request orchestration between `lifeboard-api` and UI consumers.
//!
//! - **[`Query<T>`]**: a GET endpoint bound to `{data, error, status}`.
//!   Fetches on creation (or on demand), refetches on request, and ignores
//!   responses that arrive after the binding was dropped.
//!
//! - **[`Mutation<V, T>`]**: a write endpoint (static or variable-dependent
//!   path, `POST`/`PUT`/`PATCH`/`DELETE`) that runs only when
//!   [`mutate()`](Mutation::mutate) is called, with `on_success` /
//!   `on_error` hooks.
//!
//! - **[`SessionMonitor`]**: subscribes to the client's unauthorized signal
//!   and publishes [`SessionState`] through a watch channel.
//!
//! - **[`ClientConfig`]**: how to reach the backend; builds the
//!   [`ApiClient`](lifeboard_api::ApiClient).

pub mod config;
pub mod error;
pub mod mutation;
pub mod query;
pub mod session;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, Credentials, TlsVerification};
pub use error::CoreError;
pub use mutation::{Mutation, MutationOptions};
pub use query::{Query, QueryOptions};
pub use session::{SessionMonitor, SessionState};
pub use state::{MutationState, QueryState, Status};

pub use lifeboard_api::{ApiClient, Endpoint, Error as ApiError, Method, RequestOptions};
