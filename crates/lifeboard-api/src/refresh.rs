// Session refresh coordination
//
// Single-flight wrapper around `POST {base}/auth/refresh`. Concurrent
// callers that hit a 401 at the same time all await one shared refresh.
// The call runs on its own task and clears the slot when it settles, so
// the next expiry starts a new call even if every waiter gave up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

type SharedRefresh = Shared<BoxFuture<'static, bool>>;

/// Body returned by the refresh endpoint. Only the flag matters.
#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    success: bool,
}

/// Why a refresh did not succeed. Logged, never returned to callers:
/// they only ever see `false` and, further up, `Error::SessionExpired`.
#[derive(Debug, Error)]
enum RefreshFailed {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("refresh endpoint answered HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("refresh endpoint answered without a success flag")]
    Rejected,

    #[error("unreadable refresh response: {0}")]
    Malformed(#[from] serde_json::Error),
}

struct InFlight {
    generation: u64,
    outcome: SharedRefresh,
}

/// Ensures at most one refresh HTTP call is in flight.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    url: Url,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RefreshCoordinator {
    /// `url` is the absolute refresh endpoint. `http` must share the cookie
    /// jar used by regular requests so the rotated tokens are picked up.
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self {
            http,
            url,
            in_flight: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// The refresh endpoint this coordinator calls.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Whether a refresh is currently pending.
    pub fn is_refreshing(&self) -> bool {
        lock(&self.in_flight).is_some()
    }

    /// Refresh the session, joining an in-flight refresh if there is one.
    ///
    /// Every caller that overlaps the same refresh receives the same value.
    /// Never fails: any problem with the refresh call resolves to `false`.
    pub async fn refresh(&self) -> bool {
        let outcome = {
            let mut slot = lock(&self.in_flight);
            if let Some(flight) = slot.as_ref() {
                debug!(generation = flight.generation, "joining in-flight session refresh");
                flight.outcome.clone()
            } else {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                let outcome = self.start(generation);
                *slot = Some(InFlight {
                    generation,
                    outcome: outcome.clone(),
                });
                outcome
            }
        };

        outcome.await
    }

    /// Spawn the refresh call so it settles even if every waiter is dropped.
    fn start(&self, generation: u64) -> SharedRefresh {
        let http = self.http.clone();
        let url = self.url.clone();
        let settle = ClearOnSettle {
            slot: Arc::clone(&self.in_flight),
            generation,
        };

        let task = tokio::spawn(async move {
            let _settle = settle;
            debug!(generation, "refreshing session at {url}");
            match call_refresh(&http, url).await {
                Ok(()) => {
                    debug!(generation, "session refreshed");
                    true
                }
                Err(reason) => {
                    warn!(generation, %reason, "session refresh failed");
                    false
                }
            }
        });

        async move {
            task.await.unwrap_or_else(|err| {
                warn!(generation, %err, "session refresh task did not complete");
                false
            })
        }
        .boxed()
        .shared()
    }
}

/// Clears the in-flight slot when its refresh task ends, panics included.
struct ClearOnSettle {
    slot: Arc<Mutex<Option<InFlight>>>,
    generation: u64,
}

impl Drop for ClearOnSettle {
    fn drop(&mut self) {
        let mut slot = lock(&self.slot);
        if slot.as_ref().is_some_and(|f| f.generation == self.generation) {
            *slot = None;
        }
    }
}

async fn call_refresh(http: &reqwest::Client, url: Url) -> Result<(), RefreshFailed> {
    let resp = http
        .post(url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header(ACCEPT, HeaderValue::from_static("application/json"))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(RefreshFailed::Status(status));
    }

    let body = resp.bytes().await?;
    let parsed: RefreshResponse = serde_json::from_slice(&body)?;
    if parsed.success {
        Ok(())
    } else {
        Err(RefreshFailed::Rejected)
    }
}
