//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use dashboard_config::ConfigError;
use dashboard_core::{CoreError, ErrorKind, InitError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const NETWORK: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const REMOTE: i32 = 6;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("No remote endpoint configured")]
    #[diagnostic(
        code(dashboard::no_endpoint),
        help(
            "Set `endpoint` under [remote] in {path}\n\
             Or export DASHBOARD_REMOTE__ENDPOINT=https://..."
        )
    )]
    NoEndpoint { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dashboard::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(dashboard::config))]
    Config(ConfigError),

    // ── Bootstrap ────────────────────────────────────────────────────
    #[error("Network unavailable: {reason}")]
    #[diagnostic(
        code(dashboard::network),
        help("Check your connection, or pass --local-on-failure to continue with local data.")
    )]
    Network { reason: String },

    #[error("This platform is not supported by the backend: {message}")]
    #[diagnostic(
        code(dashboard::unsupported_target),
        help("Override the platform with `target` under [remote] if the backend expects another identifier.")
    )]
    UnsupportedTarget { message: String },

    #[error("Bootstrap failed: {error}")]
    #[diagnostic(code(dashboard::bootstrap))]
    Bootstrap { error: InitError },

    #[error("Remote service error: {message}")]
    #[diagnostic(code(dashboard::remote))]
    Remote { message: String },

    #[error("Bootstrap cancelled")]
    #[diagnostic(code(dashboard::cancelled))]
    Cancelled,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(dashboard::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render config: {0}")]
    #[diagnostic(code(dashboard::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoEndpoint { .. } | Self::Config(_) | Self::Validation { .. } => {
                exit_code::CONFIG
            }
            Self::Network { .. } => exit_code::NETWORK,
            Self::UnsupportedTarget { .. } => exit_code::UNSUPPORTED,
            Self::Remote { .. } => exit_code::REMOTE,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Bootstrap { error } => match error.kind {
                ErrorKind::NetworkUnavailable | ErrorKind::RetriesExhausted => exit_code::NETWORK,
                ErrorKind::InvalidConfiguration => exit_code::CONFIG,
                ErrorKind::UnsupportedTarget => exit_code::UNSUPPORTED,
                ErrorKind::RemoteServiceError | ErrorKind::AuthenticationDisabled => {
                    exit_code::REMOTE
                }
            },
            Self::Io(_) | Self::Json(_) | Self::Toml(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingEndpoint => CliError::NoEndpoint {
                path: dashboard_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NetworkUnavailable { reason } => CliError::Network { reason },
            CoreError::InvalidConfiguration { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::InvalidBackoff { field, reason } => CliError::Validation {
                field: format!("retry.{field}"),
                reason,
            },
            CoreError::UnsupportedTarget { message } => CliError::UnsupportedTarget { message },
            CoreError::Bootstrap(error) => CliError::Bootstrap { error },
            CoreError::Cancelled => CliError::Cancelled,
            other => CliError::Remote {
                message: other.to_string(),
            },
        }
    }
}
