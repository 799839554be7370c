//! Session-aware async client for the Lifeboard backend.
//!
//! - **[`ApiClient`]**: JSON-over-HTTP transport with cookie credentials.
//!   A 401 refreshes the session once and retries once; a failed refresh or
//!   a 403 is broadcast through the client's [`UnauthorizedSignal`].
//! - **[`RefreshCoordinator`]**: single-flight refresh. Concurrent 401s share
//!   one call to `auth/refresh`.
//! - **[`UnauthorizedSignal`]**: listener registry with a reentrancy guard,
//!   so a burst of failures logs the user out once.
//! - **[`Endpoint`]**: static or variable-dependent path + method + auth flag.

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod refresh;
pub mod signal;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use endpoint::{Endpoint, EndpointPath};
pub use error::Error;
pub use refresh::RefreshCoordinator;
pub use reqwest::Method;
pub use signal::{ListenerId, Subscription, UnauthorizedSignal};
pub use transport::{TlsMode, TransportConfig};
