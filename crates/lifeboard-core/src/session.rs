// ── Session holder ──
//
// Reference consumer of the client's unauthorized signal. Subscribes once
// at construction and republishes "am I logged in" through a watch channel
// that UI layers (or the CLI) can observe.

use std::sync::Arc;

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, info};

use lifeboard_api::{ApiClient, Subscription};

use crate::error::CoreError;

/// What the application currently believes about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    /// No login or logout observed yet.
    Unknown,
    Authenticated,
    LoggedOut,
}

/// Tracks session state for one [`ApiClient`].
///
/// Dropping the monitor unsubscribes it from the client.
pub struct SessionMonitor {
    client: ApiClient,
    state: Arc<watch::Sender<SessionState>>,
    _subscription: Subscription,
}

impl SessionMonitor {
    pub fn new(client: &ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        let state = Arc::new(state);

        let sender = Arc::clone(&state);
        let subscription = client.unauthorized().subscribe(move || {
            let changed = sender.send_if_modified(|s| {
                if *s == SessionState::LoggedOut {
                    false
                } else {
                    *s = SessionState::LoggedOut;
                    true
                }
            });
            if changed {
                info!("session ended, user is logged out");
            } else {
                debug!("session already marked logged out");
            }
        });

        Self {
            client: client.clone(),
            state,
            _subscription: subscription,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_logged_out(&self) -> bool {
        self.state() == SessionState::LoggedOut
    }

    /// Record a successful login obtained elsewhere.
    pub fn mark_authenticated(&self) {
        self.state.send_replace(SessionState::Authenticated);
    }

    /// Log in through the client and mark the session authenticated.
    pub async fn login<T: DeserializeOwned>(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<T, CoreError> {
        let user = self
            .client
            .login(email, password)
            .await
            .map_err(CoreError::from_login)?;
        self.mark_authenticated();
        Ok(user)
    }

    /// Log out through the client and mark the session logged out.
    pub async fn logout(&self) -> Result<(), CoreError> {
        self.client.logout().await?;
        self.state.send_replace(SessionState::LoggedOut);
        Ok(())
    }
}
