//! Shared configuration for threescale clients.
//!
//! TOML profiles, credential resolution (env + plaintext), translation to
//! `threescale_api::ClientConfig`, and the tracing subscriber setup every
//! front-end installs first.

use std::collections::BTreeMap;
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
use tracing::debug;
use tracing_subscriber::EnvFilter;

use threescale_api::{Client, ClientConfig, Credentials, TlsMode, TransportConfig};

/// Environment variable consulted first for the log filter.
pub const LOG_ENV: &str = "THREESCALE_LOG";

/// Fallback variables for credentials a profile does not name itself.
pub const ACCESS_TOKEN_ENV: &str = "THREESCALE_ACCESS_TOKEN";
pub const PROVIDER_KEY_ENV: &str = "THREESCALE_PROVIDER_KEY";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Api(#[from] threescale_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named admin-portal profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Filter directive used when neither `THREESCALE_LOG` nor `RUST_LOG`
    /// is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            insecure: false,
            timeout: default_timeout(),
            log_level: default_log_level(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "warn".into()
}

/// A named admin portal.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Admin portal URL (e.g., "https://acme-admin.3scale.net").
    pub endpoint: String,

    /// Access token (plaintext, prefer an env var).
    pub access_token: Option<String>,

    /// Environment variable name containing the access token.
    pub access_token_env: Option<String>,

    /// Provider key (plaintext, prefer an env var).
    pub provider_key: Option<String>,

    /// Environment variable name containing the provider key.
    pub provider_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

impl Config {
    /// The profile called `name`, or the default profile.
    pub fn profile<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .ok_or_else(|| ConfigError::Validation {
                field: "default_profile".into(),
                reason: "no profile named and no default configured".into(),
            })?;
        let profile = self.profiles.get(name).ok_or_else(|| ConfigError::Validation {
            field: "profile".into(),
            reason: format!("unknown profile '{name}'"),
        })?;
        Ok((name, profile))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "threescale", "threescale").map_or_else(
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
    p.push("threescale");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `THREESCALE_`-prefixed variables override the file; nested keys are
/// separated by a double underscore (`THREESCALE_DEFAULTS__TIMEOUT=5`,
/// `THREESCALE_PROFILES__PROD__ENDPOINT=...`). A missing file is not an
/// error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("THREESCALE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// First value found: the profile's named env var, the fallback env var,
/// then the plaintext field.
fn lookup_secret(
    named_env: Option<&str>,
    fallback_env: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    named_env
        .and_then(env_value)
        .or_else(|| env_value(fallback_env))
        .or_else(|| plaintext.filter(|v| !v.is_empty()).map(str::to_owned))
        .map(SecretString::from)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Resolve the credential for a profile. An access token wins over a
/// provider key when both resolve.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    let access_token = lookup_secret(
        profile.access_token_env.as_deref(),
        ACCESS_TOKEN_ENV,
        profile.access_token.as_deref(),
    );
    let provider_key = lookup_secret(
        profile.provider_key_env.as_deref(),
        PROVIDER_KEY_ENV,
        profile.provider_key.as_deref(),
    );
    Credentials::resolve(provider_key, access_token).map_err(|_| ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ClientConfig` from a profile and the global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = profile
        .endpoint
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {}", profile.endpoint),
        })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let credentials = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig {
        endpoint: profile.endpoint.clone(),
        credentials,
        transport: TransportConfig {
            tls,
            timeout,
            ..TransportConfig::default()
        },
    })
}

/// Load the config and connect with the named (or default) profile.
pub fn connect(profile_name: Option<&str>) -> Result<Client, ConfigError> {
    let config = load_config()?;
    let (name, profile) = config.profile(profile_name)?;
    let client_config = profile_to_client_config(profile, name, &config.defaults)?;
    Ok(Client::new(&client_config)?)
}

// ── Logging ─────────────────────────────────────────────────────────

/// Log filter from `THREESCALE_LOG`, then `RUST_LOG`, then `level`.
/// Blank variables count as unset.
pub fn log_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    let (field, directives) = [LOG_ENV, EnvFilter::DEFAULT_ENV]
        .into_iter()
        .find_map(|var| env_value(var).map(|value| (var, value)))
        .unwrap_or_else(|| ("log_level", level.to_owned()));
    EnvFilter::try_new(&directives).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

/// Install the global fmt subscriber. Fails if one is already installed.
pub fn init_logging(level: &str) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level)?)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
