use thiserror::Error;

/// Top-level error type for the `lifeboard-api` crate.
///
/// Session failures (`SessionExpired`, `AccessDenied`) have already been
/// broadcast through the client's [`UnauthorizedSignal`](crate::UnauthorizedSignal)
/// by the time a caller sees them. Everything else stays local to the caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Session ─────────────────────────────────────────────────────
    /// A 401 was observed and the refresh flow could not recover it.
    #[error("Session expired -- please log in again")]
    SessionExpired,

    /// The backend answered 403. Carries the server message when one was sent.
    #[error("{message}")]
    AccessDenied { message: String },

    // ── Request ─────────────────────────────────────────────────────
    /// Any other non-2xx response. `message` is the server-provided
    /// `{"message": ...}` when present, otherwise `HTTP <status>`.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// The HTTP call itself failed (offline, DNS, TLS, timeout).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A 2xx body could not be decoded, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request body could not be encoded as JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for the failures that end the session
    /// (and therefore triggered a logout notification).
    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::AccessDenied { .. })
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The HTTP status behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::AccessDenied { .. } => Some(403),
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
