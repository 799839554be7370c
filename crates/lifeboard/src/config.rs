//! CLI-side configuration: global flag overrides on top of the shared
//! `lifeboard-config` profiles.

use lifeboard_config::{self as shared, Config, Profile};
use lifeboard_core::ClientConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Everything a command needs to reach the backend.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub client: ClientConfig,
    pub output: OutputFormat,
}

/// Output format: flag, then config default.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .unwrap_or_else(|| output::format_from_config(&cfg.defaults.output))
}

/// Load config and apply global flags (flag > env > profile > defaults).
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = shared::load_config()?;
    let profile_name = shared::active_profile_name(global.profile.as_deref(), &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly named profile must exist unless the URL comes from flags.
        None if global.profile.is_some() && global.base_url.is_none() => {
            return Err(profile_not_found(profile_name, &cfg));
        }
        None => Profile::default(),
    };

    if let Some(ref url) = global.base_url {
        profile.base_url.clone_from(url);
    }
    if profile.base_url.is_empty() {
        return Err(CliError::NoConfig {
            path: shared::config_path().display().to_string(),
        });
    }
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let client = shared::profile_to_client_config(&profile, &profile_name, &cfg.defaults)?;

    Ok(Resolved {
        output: output_format(global, &cfg),
        profile_name,
        client,
    })
}

fn profile_not_found(name: String, cfg: &Config) -> CliError {
    let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}
