//! Configuration for the dashboard CLI.
//!
//! TOML file + `DASHBOARD_` environment overrides, API key resolution
//! (env var → keyring → plaintext), and translation to
//! `dashboard_core::BootstrapConfig`.

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

use dashboard_core::{BackoffPolicy, BootstrapConfig, RemoteConfig, TcpProbe, TlsVerification};

const KEYRING_SERVICE: &str = "dashboard";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("remote endpoint is not configured")]
    MissingEndpoint,

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

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub bootstrap: BootstrapSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub connectivity: ConnectivitySection,
    #[serde(default)]
    pub defaults: Defaults,
}

/// `[remote]`: the backend to bootstrap against.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSection {
    /// Backend base URL (e.g. "https://api.example.com").
    pub endpoint: Option<String>,

    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Platform identifier; defaults to the running `{os}-{arch}`.
    pub target: Option<String>,

    /// Plaintext API key; the keyring or `api_key_env` take precedence.
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_true")]
    pub anonymous_auth: bool,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            project_id: default_project_id(),
            target: None,
            api_key: None,
            api_key_env: None,
            ca_cert: None,
            insecure: false,
            anonymous_auth: true,
        }
    }
}

/// `[bootstrap]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapSection {
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub local_fallback: bool,
    #[serde(default = "default_true")]
    pub auto_restore: bool,
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            local_fallback: true,
            auto_restore: true,
        }
    }
}

/// Named backoff presets, plus `custom` for hand-tuned values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPreset {
    #[default]
    Conservative,
    Aggressive,
    Fast,
    Custom,
}

impl RetryPreset {
    pub fn policy(self) -> BackoffPolicy {
        match self {
            Self::Conservative | Self::Custom => BackoffPolicy::conservative(),
            Self::Aggressive => BackoffPolicy::aggressive(),
            Self::Fast => BackoffPolicy::fast(),
        }
    }
}

/// `[retry]`: a preset, optionally overridden field by field.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetrySection {
    #[serde(default)]
    pub preset: RetryPreset,
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
    pub jitter: Option<f64>,
    pub max_attempts: Option<u32>,
}

impl RetrySection {
    /// Resolve to a validated policy. Unset fields fall back to the preset.
    pub fn to_policy(&self) -> Result<BackoffPolicy, ConfigError> {
        let base = self.preset.policy();
        BackoffPolicy::new(
            self.initial_delay_ms
                .map_or(base.initial_delay(), Duration::from_millis),
            self.max_delay_ms.map_or(base.max_delay(), Duration::from_millis),
            self.multiplier.unwrap_or(base.multiplier()),
            self.jitter.unwrap_or(base.jitter_factor()),
            self.max_attempts.unwrap_or(base.max_attempts()),
        )
        .map_err(|e| invalid("retry", e.to_string()))
    }
}

/// `[connectivity]`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectivitySection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_probe_hosts")]
    pub probe_hosts: Vec<String>,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivitySection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            probe_hosts: default_probe_hosts(),
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl ConnectivitySection {
    pub fn probe(&self) -> TcpProbe {
        TcpProbe::new(self.probe_hosts.clone(), self.probe_timeout())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// `[defaults]`: CLI presentation defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_project_id() -> String {
    "dashboard".into()
}
fn default_call_timeout() -> u64 {
    5
}
fn default_poll_interval() -> u64 {
    10
}
fn default_probe_hosts() -> Vec<String> {
    vec!["1.1.1.1:53".into(), "8.8.8.8:53".into()]
}
fn default_probe_timeout() -> u64 {
    1500
}
fn default_output() -> String {
    "table".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dashboard", "dashboard").map_or_else(
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
    p.push("dashboard");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields the defaults.
///
/// Environment keys use `__` between section and field, e.g.
/// `DASHBOARD_REMOTE__ENDPOINT`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DASHBOARD_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Where an API key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    Keyring,
    Plaintext,
}

/// Resolve the project API key. The key is optional: `None` means the
/// backend is used without one.
pub fn resolve_api_key(remote: &RemoteSection) -> Option<(SecretString, KeySource)> {
    // 1. api_key_env → env var lookup
    if let Some(ref env_name) = remote.api_key_env
        && let Ok(val) = std::env::var(env_name)
    {
        return Some((SecretString::from(val), KeySource::Env));
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{}/api-key", remote.project_id))
        && let Ok(secret) = entry.get_password()
    {
        return Some((SecretString::from(secret), KeySource::Keyring));
    }

    // 3. Plaintext in config
    remote
        .api_key
        .as_ref()
        .map(|key| (SecretString::from(key.clone()), KeySource::Plaintext))
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `BootstrapConfig` from the loaded file.
///
/// Parsing plus the zero-duration checks the network check depends on;
/// the rest of structural validation is the controller's ConfigValidation
/// phase.
pub fn to_bootstrap_config(cfg: &Config) -> Result<BootstrapConfig, ConfigError> {
    let raw = cfg.remote.endpoint.as_deref().ok_or(ConfigError::MissingEndpoint)?;
    if cfg.bootstrap.call_timeout_secs == 0 {
        return Err(invalid("bootstrap.call_timeout_secs", "must be greater than zero"));
    }
    if cfg.connectivity.poll_interval_secs == 0 {
        return Err(invalid("connectivity.poll_interval_secs", "must be greater than zero"));
    }
    let endpoint: url::Url = raw
        .parse()
        .map_err(|_| invalid("remote.endpoint", format!("invalid URL: {raw}")))?;

    let tls = if cfg.remote.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.remote.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut remote = RemoteConfig::new(endpoint, cfg.remote.project_id.clone());
    if let Some(ref target) = cfg.remote.target {
        remote.target.clone_from(target);
    }
    remote.api_key = resolve_api_key(&cfg.remote).map(|(key, _)| key);
    remote.tls = tls;
    remote.anonymous_auth = cfg.remote.anonymous_auth;

    let mut bootstrap = BootstrapConfig::new(remote);
    bootstrap.call_timeout = Duration::from_secs(cfg.bootstrap.call_timeout_secs);
    bootstrap.local_fallback = cfg.bootstrap.local_fallback;
    bootstrap.auto_restore = cfg.bootstrap.auto_restore;
    bootstrap.retry = cfg.retry.to_policy()?;
    bootstrap.poll_interval = cfg.connectivity.poll_interval();
    Ok(bootstrap)
}
