// ── Core error types ──
//
// User-facing errors from lifeboard-core. The `From<lifeboard_api::Error>`
// impl translates transport-layer errors into the categories the CLI maps
// to diagnostics and exit codes.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired -- please log in again")]
    SessionExpired,

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    // ── API errors ───────────────────────────────────────────────────
    #[error("{message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Login answers 401 for bad credentials; everything else maps as usual.
    pub(crate) fn from_login(err: lifeboard_api::Error) -> Self {
        match err {
            lifeboard_api::Error::RequestFailed {
                status: 400 | 401,
                message,
            } => CoreError::AuthenticationFailed { message },
            other => other.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lifeboard_api::Error> for CoreError {
    fn from(err: lifeboard_api::Error) -> Self {
        match err {
            lifeboard_api::Error::SessionExpired => CoreError::SessionExpired,
            lifeboard_api::Error::AccessDenied { message } => CoreError::AccessDenied { message },
            lifeboard_api::Error::RequestFailed { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            lifeboard_api::Error::Network(e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        url: e.url().map(ToString::to_string).unwrap_or_default(),
                        reason: e.to_string(),
                    }
                }
            }
            lifeboard_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            lifeboard_api::Error::Tls(message) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: message,
            },
            other @ (lifeboard_api::Error::Deserialization { .. }
            | lifeboard_api::Error::Serialization(_)) => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
