// ── Runtime connection configuration ──
//
// These types describe *how* to reach the backend. They carry credential
// data and connection tuning, but never touch disk. The CLI builds a
// `ClientConfig` from its profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lifeboard_api::transport::{DEFAULT_REFRESH_PATH, DEFAULT_UNAUTHORIZED_WINDOW};
use lifeboard_api::{ApiClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Email/password pair for `auth/login`.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (local development backends).
    DangerAcceptInvalid,
}

/// Configuration for one backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL (e.g., `https://lifeboard.example/api`).
    pub base_url: Url,
    /// Login credentials, when known.
    pub credentials: Option<Credentials>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Refresh endpoint relative to `base_url`.
    pub refresh_path: String,
    /// Reentrancy window for logout notifications.
    pub unauthorized_window: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_path: DEFAULT_REFRESH_PATH.into(),
            unauthorized_window: DEFAULT_UNAUTHORIZED_WINDOW,
        }
    }

    /// Translate into the api crate's transport settings.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };

        TransportConfig {
            tls,
            timeout: self.timeout,
            cookie_jar: None,
            refresh_path: self.refresh_path.clone(),
            unauthorized_window: self.unauthorized_window,
        }
        .with_cookie_jar()
    }

    /// Build the session-aware client with a fresh cookie jar.
    pub fn build_client(&self) -> Result<ApiClient, CoreError> {
        Ok(ApiClient::new(self.base_url.as_str(), &self.transport())?)
    }
}
