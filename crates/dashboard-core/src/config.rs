// ── Runtime bootstrap configuration ──
//
// These types describe *what* to bootstrap against and *how* patiently.
// They carry credential data and tuning, but never touch disk.
// The CLI constructs a `BootstrapConfig` and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use dashboard_api::transport::{TlsMode, TransportConfig};
use dashboard_api::RemoteClient;

use crate::backoff::BackoffPolicy;
use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development backends).
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Where the remote backend lives and how this client identifies itself.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Backend base URL (e.g. `https://api.example.com`).
    pub endpoint: Url,
    /// Project identifier sent on initialization.
    pub project_id: String,
    /// Platform/target identifier; the remote may reject unsupported ones.
    pub target: String,
    /// Project API key, if the backend requires one.
    pub api_key: Option<SecretString>,
    pub tls: TlsVerification,
    /// Attempt anonymous sign-in when no identity is cached.
    pub anonymous_auth: bool,
}

impl RemoteConfig {
    pub fn new(endpoint: Url, project_id: impl Into<String>) -> Self {
        Self {
            endpoint,
            project_id: project_id.into(),
            target: default_target(),
            api_key: None,
            tls: TlsVerification::default(),
            anonymous_auth: true,
        }
    }

    /// Build the HTTP client for this remote.
    pub fn build_client(&self, timeout: Duration) -> Result<RemoteClient, CoreError> {
        let transport = TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout,
            api_key: self.api_key.clone(),
        };
        Ok(RemoteClient::new(self.endpoint.clone(), &transport)?)
    }
}

/// The `{os}-{arch}` string of the running binary.
pub fn default_target() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Everything the initialization controller needs.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub remote: RemoteConfig,
    /// Upper bound on every remote call (probe, init, sign-in, dependency).
    pub call_timeout: Duration,
    /// Fall back to local repositories when the host is offline.
    pub local_fallback: bool,
    /// Return to live repositories when connectivity comes back.
    pub auto_restore: bool,
    /// Policy used by `run()` and by `retry(None)`.
    pub retry: BackoffPolicy,
    /// How often the connectivity monitor polls its probe.
    pub poll_interval: Duration,
}

impl BootstrapConfig {
    pub fn new(remote: RemoteConfig) -> Self {
        Self {
            remote,
            call_timeout: Duration::from_secs(5),
            local_fallback: true,
            auto_restore: true,
            retry: BackoffPolicy::default(),
            poll_interval: Duration::from_secs(10),
        }
    }

    /// Structural validation, run by the `ConfigValidation` phase.
    pub fn validate(&self) -> Result<(), CoreError> {
        let remote = &self.remote;
        if !matches!(remote.endpoint.scheme(), "http" | "https") {
            return Err(CoreError::config(format!(
                "endpoint must be http or https, got {}",
                remote.endpoint.scheme()
            )));
        }
        if remote.endpoint.host_str().is_none_or(str::is_empty) {
            return Err(CoreError::config("endpoint has no host"));
        }
        if remote.project_id.trim().is_empty() {
            return Err(CoreError::config("project id is empty"));
        }
        if remote.target.trim().is_empty() {
            return Err(CoreError::config("target is empty"));
        }
        if remote
            .api_key
            .as_ref()
            .is_some_and(|k| k.expose_secret().trim().is_empty())
        {
            return Err(CoreError::config("API key is set but empty"));
        }
        if self.call_timeout.is_zero() {
            return Err(CoreError::config("call timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::config("poll interval must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> BootstrapConfig {
        BootstrapConfig::new(RemoteConfig::new(
            "https://api.example.com".parse().unwrap(),
            "home-dashboard",
        ))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = config();
        cfg.validate().unwrap();
        assert!(cfg.local_fallback);
        assert!(cfg.remote.anonymous_auth);
        assert_eq!(cfg.retry, BackoffPolicy::conservative());
    }

    #[test]
    fn validation_rejects_structural_problems() {
        let mut cfg = config();
        cfg.remote.project_id = "  ".into();
        assert!(matches!(
            cfg.validate(),
            Err(CoreError::InvalidConfiguration { .. })
        ));

        let mut cfg = config();
        cfg.remote.endpoint = "ftp://files.example.com".parse().unwrap();
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.call_timeout = Duration::ZERO;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.remote.api_key = Some(SecretString::from(String::new()));
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn target_names_the_running_platform() {
        let target = default_target();
        assert!(target.contains(std::env::consts::ARCH));
    }
}
