//! `login`, `whoami`, `logout`.

use serde_json::Value;

use super::Session;
use crate::cli::{GlobalOpts, LogoutArgs};
use crate::error::CliError;
use crate::output;

/// Verify the profile's credentials and print the user payload.
pub async fn login(global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::open(global)?;
    let user = session.login().await?;

    output::print_success(
        &format!("Logged in to {}", session.client.base_url()),
        global.quiet,
    );
    let out = output::render(session.resolved.output, &user)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Log in, then ask the backend who it thinks we are.
pub async fn whoami(global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::open(global)?;
    session.login().await?;

    let me: Value = session
        .client
        .current_user()
        .await
        .map_err(|e| session.fail(e))?;

    let out = output::render(session.resolved.output, &me)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Log in (to obtain the cookies to revoke), then end the session.
pub async fn logout(args: LogoutArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::open(global)?;
    session.login().await?;
    session.monitor.logout().await?;

    if args.forget {
        lifeboard_config::delete_password(&session.resolved.profile_name)?;
        output::print_success(
            &format!(
                "Removed stored password for profile '{}'",
                session.resolved.profile_name
            ),
            global.quiet,
        );
    }

    output::print_success(
        &format!("Session on {} ended", session.client.base_url()),
        global.quiet,
    );
    Ok(())
}
