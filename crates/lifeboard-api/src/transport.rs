// Shared transport configuration for building the session-aware client.
//
// TLS, timeout, cookie jar, and the session tuning knobs (refresh path,
// unauthorized guard window) live here so the CLI and tests build
// `ApiClient` instances the same way.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

/// Default refresh endpoint, relative to the API base URL.
pub const DEFAULT_REFRESH_PATH: &str = "auth/refresh";

/// Default reentrancy window for unauthorized notifications.
pub const DEFAULT_UNAUTHORIZED_WINDOW: Duration = Duration::from_secs(1);

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local development backends).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    /// Cookie jar holding the access and refresh tokens. A fresh jar is
    /// created by [`ApiClient::new`](crate::ApiClient::new) when absent.
    pub cookie_jar: Option<Arc<Jar>>,
    /// Refresh endpoint path, joined onto the base URL.
    pub refresh_path: String,
    /// How long a logout notification suppresses further ones.
    pub unauthorized_window: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
            refresh_path: DEFAULT_REFRESH_PATH.into(),
            unauthorized_window: DEFAULT_UNAUTHORIZED_WINDOW,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("lifeboard/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar.
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Override the unauthorized notification window.
    pub fn with_unauthorized_window(mut self, window: Duration) -> Self {
        self.unauthorized_window = window;
        self
    }
}
