//! Shared configuration for Lifeboard tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `lifeboard_core::ClientConfig`. The CLI layers its
//! flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lifeboard_core::{ClientConfig, Credentials, TlsVerification};

/// Service name under which passwords are stored in the system keyring.
pub const KEYRING_SERVICE: &str = "lifeboard";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LIFEBOARD_CONFIG";

/// Fallback email when a profile has none.
pub const EMAIL_ENV: &str = "LIFEBOARD_EMAIL";

/// Password taking precedence over keyring and plaintext.
pub const PASSWORD_ENV: &str = "LIFEBOARD_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "json".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g., "https://lifeboard.example/api").
    pub base_url: String,

    /// Login email.
    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Refresh endpoint relative to `base_url`.
    pub refresh_path: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `LIFEBOARD_CONFIG`, then platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("com", "lifeboard", "lifeboard").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lifeboard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys nest with `__`: `LIFEBOARD_DEFAULTS__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LIFEBOARD_").split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile selection ───────────────────────────────────────────────

/// Requested name, else the config's default, else `"default"`.
pub fn active_profile_name(requested: Option<&str>, cfg: &Config) -> String {
    requested
        .map(ToOwned::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

// ── Credential resolution ───────────────────────────────────────────

/// Profile email, falling back to `LIFEBOARD_EMAIL`.
pub fn resolve_email(profile: &Profile) -> Option<String> {
    profile
        .email
        .clone()
        .or_else(|| std::env::var(EMAIL_ENV).ok())
}

/// Resolve the password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env -> env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Email and password for `profile_name`.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let email = resolve_email(profile).ok_or_else(|| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials { email, password })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

/// Remove a profile's password from the system keyring. Absent is fine.
pub fn delete_password(profile_name: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

// ── Translation to core ─────────────────────────────────────────────

/// Parse and validate a base URL.
pub fn parse_base_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "base_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }

    Ok(url)
}

/// Build a `ClientConfig` from a profile. No CLI flag overrides.
///
/// Credentials are attached when they resolve; commands that need them
/// check for their absence.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::new(parse_base_url(&profile.base_url)?);

    config.credentials = resolve_credentials(profile, profile_name).ok();

    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    if let Some(ref refresh_path) = profile.refresh_path {
        config.refresh_path.clone_from(refresh_path);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        default_profile = "home"

        [defaults]
        timeout = 15

        [profiles.home]
        base_url = "https://lifeboard.test/api"
        email = "ada@example.com"
        password_env = "HOME_LIFEBOARD_PW"
        refresh_path = "session/renew"

        [profiles.dev]
        base_url = "http://localhost:8080/api"
        insecure = true
        timeout = 5
    "#;

    #[test]
    fn loads_profiles_and_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("LIFEBOARD_DEFAULTS__OUTPUT", "yaml");

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.default_profile.as_deref(), Some("home"));
            assert_eq!(cfg.defaults.timeout, 15);
            assert_eq!(cfg.defaults.output, "yaml");
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profiles["dev"].insecure, Some(true));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let cfg = load_config_from(&jail.directory().join("absent.toml"))
                .map_err(|e| e.to_string())?;

            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.timeout, 30);
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn profile_translates_to_client_config() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("HOME_LIFEBOARD_PW", "hunter2");

            let cfg = load_config_from(&jail.directory().join("config.toml"))
                .map_err(|e| e.to_string())?;
            let name = active_profile_name(None, &cfg);
            let client = profile_to_client_config(&cfg.profiles[&name], &name, &cfg.defaults)
                .map_err(|e| e.to_string())?;

            assert_eq!(client.base_url.as_str(), "https://lifeboard.test/api");
            assert_eq!(client.tls, TlsVerification::SystemDefaults);
            assert_eq!(client.timeout, Duration::from_secs(15));
            assert_eq!(client.refresh_path, "session/renew");

            let creds = client.credentials.unwrap();
            assert_eq!(creds.email, "ada@example.com");
            assert_eq!(creds.password.expose_secret(), "hunter2");
            Ok(())
        });
    }

    #[test]
    fn profile_overrides_defaults() {
        let defaults = Defaults::default();
        let profile = Profile {
            base_url: "http://localhost:8080/api".into(),
            insecure: Some(true),
            timeout: Some(5),
            ..Profile::default()
        };

        let client = profile_to_client_config(&profile, "dev", &defaults).unwrap();
        assert_eq!(client.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn plaintext_password_is_last_resort() {
        Jail::expect_with(|_jail| {
            let profile = Profile {
                base_url: "https://lifeboard.test/api".into(),
                email: Some("ada@example.com".into()),
                password: Some("plain".into()),
                password_env: Some("LIFEBOARD_TEST_UNSET_PW".into()),
                ..Profile::default()
            };

            let pw = resolve_password(&profile, "lifeboard-test-no-keyring")
                .map_err(|e| e.to_string())?;
            assert_eq!(pw.expose_secret(), "plain");
            Ok(())
        });
    }

    #[test]
    fn missing_email_means_no_credentials() {
        let profile = Profile {
            base_url: "https://lifeboard.test/api".into(),
            password: Some("plain".into()),
            ..Profile::default()
        };

        if std::env::var_os(EMAIL_ENV).is_none() {
            let err = resolve_credentials(&profile, "nobody").unwrap_err();
            assert!(matches!(err, ConfigError::NoCredentials { ref profile } if profile == "nobody"));
        }
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = parse_base_url("ftp://lifeboard.test").unwrap_err();
        assert!(err.to_string().contains("expected http or https"));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                base_url: "https://lifeboard.test/api".into(),
                email: Some("ada@example.com".into()),
                ..Profile::default()
            },
        );
        save_config_to(&path, &cfg).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[profiles.default]"));
        assert!(!written.contains("password"));

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].email.as_deref(), Some("ada@example.com"));
    }
}
