//! Command dispatch and the shared logged-in session.

pub mod config_cmd;
pub mod request;
pub mod session;

use lifeboard_core::{ApiClient, ApiError, CoreError, Method, SessionMonitor};
use tracing::debug;

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;

/// A client plus the monitor tracking its session.
pub struct Session {
    pub client: ApiClient,
    pub monitor: SessionMonitor,
    pub resolved: Resolved,
}

impl Session {
    /// Build the client for the active profile without logging in.
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let resolved = config::resolve(global)?;
        let client = resolved.client.build_client()?;
        let monitor = SessionMonitor::new(&client);
        debug!(
            profile = %resolved.profile_name,
            base_url = %client.base_url(),
            "client ready"
        );
        Ok(Self {
            client,
            monitor,
            resolved,
        })
    }

    /// Log in with the resolved credentials. Returns the user payload.
    pub async fn login(&self) -> Result<serde_json::Value, CliError> {
        let profile = &self.resolved.profile_name;
        let creds = self
            .resolved
            .client
            .credentials
            .as_ref()
            .ok_or_else(|| CliError::NoCredentials {
                profile: profile.clone(),
            })?;

        self.monitor
            .login(&creds.email, &creds.password)
            .await
            .map_err(|e| CliError::from(e).with_profile(profile))
    }

    /// Translate an api-layer error for this session.
    pub fn fail(&self, err: ApiError) -> CliError {
        CliError::from(CoreError::from(err)).with_profile(&self.resolved.profile_name)
    }
}

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Get(args) => request::get(args, global).await,
        Command::Delete(args) => request::delete(args, global).await,
        Command::Post(args) => request::send(Method::POST, args, global).await,
        Command::Put(args) => request::send(Method::PUT, args, global).await,
        Command::Patch(args) => request::send(Method::PATCH, args, global).await,
        Command::Login => session::login(global).await,
        Command::Whoami => session::whoami(global).await,
        Command::Logout(args) => session::logout(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }
    }
}

fn completions(args: &CompletionsArgs) {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "lifeboard", &mut std::io::stdout());
}
