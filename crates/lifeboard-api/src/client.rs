// Session-aware HTTP client
//
// Single point of contact with the backend. Wraps `reqwest::Client` with
// base-path URL construction, JSON encoding, response classification, and
// the retry-once-after-refresh policy. The refresh coordinator and the
// unauthorized signal are owned here so every clone of the client shares
// one refresh slot, one listener registry, and one reentrancy guard.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::refresh::RefreshCoordinator;
use crate::signal::UnauthorizedSignal;
use crate::transport::TransportConfig;

/// A request is retried at most this many times after a session refresh.
const MAX_RETRIES: u8 = 1;

/// Error body shape shared by every backend endpoint.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Per-call options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Whether a 401 on this call goes through the refresh flow.
    /// Cookies are sent either way.
    pub auth: bool,
    /// Extra headers; these override the JSON defaults.
    pub headers: HeaderMap,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            auth: true,
            headers: HeaderMap::new(),
        }
    }
}

impl RequestOptions {
    /// Options for endpoints that must never trigger a refresh
    /// (login, logout, public reads).
    pub fn public() -> Self {
        Self {
            auth: false,
            ..Self::default()
        }
    }

    pub fn auth(mut self, auth: bool) -> Self {
        self.auth = auth;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Async client for the Lifeboard backend.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Construct one at startup and
/// hand clones to everything that talks to the backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    cookie_jar: Option<Arc<Jar>>,
    refresher: RefreshCoordinator,
    unauthorized: UnauthorizedSignal,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url` (e.g. `https://lifeboard.example/api`).
    ///
    /// If the config doesn't already include a cookie jar, one is created:
    /// the session lives entirely in cookies.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Self::assemble(base_url, http, config.cookie_jar.clone(), &config)
    }

    /// Wrap an existing `reqwest::Client` (caller manages cookies and TLS).
    ///
    /// Only the session knobs of `transport` are used.
    pub fn with_client(
        base_url: &str,
        http: reqwest::Client,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::assemble(base_url, http, None, transport)
    }

    fn assemble(
        base_url: &str,
        http: reqwest::Client,
        cookie_jar: Option<Arc<Jar>>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        let refresh_url = base_url.join(transport.refresh_path.trim_start_matches('/'))?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                refresher: RefreshCoordinator::new(http.clone(), refresh_url),
                unauthorized: UnauthorizedSignal::new(transport.unauthorized_window),
                http,
                base_url,
                cookie_jar,
            }),
        })
    }

    /// Ensure the base URL ends with `/` so relative paths join beneath it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// The cookie jar holding the session, when this client owns one.
    pub fn cookie_jar(&self) -> Option<&Arc<Jar>> {
        self.inner.cookie_jar.as_ref()
    }

    /// The logout notification hub. Session holders subscribe here.
    pub fn unauthorized(&self) -> &UnauthorizedSignal {
        &self.inner.unauthorized
    }

    /// The single-flight refresh coordinator.
    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.inner.refresher
    }

    /// Refresh the session now, joining any refresh already in flight.
    pub async fn refresh_session(&self) -> bool {
        self.inner.refresher.refresh().await
    }

    /// Join a relative path (e.g. `"habits/42"`) onto the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Core request ─────────────────────────────────────────────────

    /// Issue a request and decode the JSON response.
    ///
    /// A 401 on an authenticated call refreshes the session once and
    /// retries once. A body that serializes to `null` is not sent.
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        let body = encode_body(body)?;
        let mut retry_count: u8 = 0;

        loop {
            let resp = self
                .send(method.clone(), url.clone(), body.as_deref(), options)
                .await?;

            if resp.status() != StatusCode::UNAUTHORIZED || !options.auth {
                return self.handle_response(resp).await;
            }

            if retry_count < MAX_RETRIES {
                debug!("{method} {url} answered 401, refreshing session");
                if self.inner.refresher.refresh().await {
                    retry_count += 1;
                    continue;
                }
            } else {
                debug!("{method} {url} still unauthorized after refresh");
            }

            warn!("{method} {url}: session expired");
            self.inner.unauthorized.notify();
            return Err(Error::SessionExpired);
        }
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&[u8]>,
        options: &RequestOptions,
    ) -> Result<reqwest::Response, Error> {
        debug!("{method} {url}");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(options.headers.clone());

        let mut builder = self.inner.http.request(method, url).headers(headers);
        if let Some(bytes) = body {
            builder = builder.body(bytes.to_vec());
        }

        Ok(builder.send().await?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            let body = resp.text().await?;
            return decode_body(body);
        }

        if status == StatusCode::FORBIDDEN {
            let message = error_message(resp)
                .await
                .unwrap_or_else(|| "Access denied".into());
            warn!(%message, "access denied");
            self.inner.unauthorized.notify();
            return Err(Error::AccessDenied { message });
        }

        let message = error_message(resp)
            .await
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Err(Error::RequestFailed {
            status: status.as_u16(),
            message,
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.get_with(path, &RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, Error> {
        self.request::<T, ()>(Method::GET, path, None, options).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.post_with(path, body, &RequestOptions::default()).await
    }

    pub async fn post_with<T, B>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body), options).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.put_with(path, body, &RequestOptions::default()).await
    }

    pub async fn put_with<T, B>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body), options).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.patch_with(path, body, &RequestOptions::default()).await
    }

    pub async fn patch_with<T, B>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.delete_with(path, &RequestOptions::default()).await
    }

    pub async fn delete_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, Error> {
        self.request::<T, ()>(Method::DELETE, path, None, options).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("unauthorized", &self.inner.unauthorized)
            .finish_non_exhaustive()
    }
}

// ── Body helpers ─────────────────────────────────────────────────────

/// Encode a request body once so a retry can resend the same bytes.
fn encode_body<B: Serialize + ?Sized>(body: Option<&B>) -> Result<Option<Vec<u8>>, Error> {
    let Some(body) = body else {
        return Ok(None);
    };
    let value = serde_json::to_value(body)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_vec(&value)?))
}

/// Decode a 2xx body. An empty body reads as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    let raw = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(raw).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body,
        }
    })
}

/// Extract `{"message": ...}` from an error response, if there is one.
async fn error_message(resp: reqwest::Response) -> Option<String> {
    let raw = resp.text().await.ok()?;
    serde_json::from_str::<ErrorBody>(&raw).ok()?.message
}
