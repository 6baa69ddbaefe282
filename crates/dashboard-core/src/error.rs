// ── Core error types ──
//
// User-facing errors from dashboard-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<dashboard_api::Error>`
// impl translates transport-layer errors into the bootstrap taxonomy.

use thiserror::Error;

use crate::bootstrap::{ErrorKind, InitError};
use crate::repository::Domain;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Bootstrap taxonomy ───────────────────────────────────────────
    #[error("Network unavailable: {reason}")]
    NetworkUnavailable { reason: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Unsupported target: {message}")]
    UnsupportedTarget { message: String },

    #[error("Remote service error: {message}")]
    RemoteService {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Authentication disabled: {message}")]
    AuthenticationDisabled { message: String },

    /// A bootstrap run ended in a terminal error.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(InitError),

    /// A bootstrap run was cancelled before it finished.
    #[error("Operation cancelled")]
    Cancelled,

    // ── Repository access ────────────────────────────────────────────
    #[error("Repositories are not initialized")]
    NotInitialized,

    #[error("The {domain} repository requires authentication")]
    AuthenticationRequired { domain: Domain },

    #[error("No signed-in identity")]
    Unauthenticated,

    #[error("Mode switch failed: {message}")]
    SwitchFailed { message: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Policy ───────────────────────────────────────────────────────
    #[error("Invalid backoff policy: {field} {reason}")]
    InvalidBackoff { field: &'static str, reason: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Classify this error into the bootstrap taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkUnavailable { .. } => ErrorKind::NetworkUnavailable,
            Self::InvalidConfiguration { .. } | Self::InvalidBackoff { .. } => {
                ErrorKind::InvalidConfiguration
            }
            Self::UnsupportedTarget { .. } => ErrorKind::UnsupportedTarget,
            Self::AuthenticationDisabled { .. } => ErrorKind::AuthenticationDisabled,
            Self::Bootstrap(err) => err.kind,
            _ => ErrorKind::RemoteServiceError,
        }
    }

    /// Whether re-attempting the failed step may succeed unaided.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub(crate) fn network(reason: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            reason: reason.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dashboard_api::Error> for CoreError {
    fn from(err: dashboard_api::Error) -> Self {
        if err.is_not_found() {
            let identifier = match &err {
                dashboard_api::Error::Transport(e) => {
                    e.url().map(|u| u.path().to_string()).unwrap_or_default()
                }
                dashboard_api::Error::Api { message, .. } => message.clone(),
                _ => String::new(),
            };
            return CoreError::NotFound {
                entity_type: "resource".into(),
                identifier,
            };
        }

        let transient = err.is_transient();
        let code = err.api_error_code().map(str::to_owned);
        match err {
            dashboard_api::Error::Transport(e) if transient => CoreError::NetworkUnavailable {
                reason: e.to_string(),
            },
            dashboard_api::Error::Transport(e) => CoreError::RemoteService {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            },
            dashboard_api::Error::InvalidUrl(e) => CoreError::InvalidConfiguration {
                message: format!("invalid URL: {e}"),
            },
            dashboard_api::Error::Tls(msg) => CoreError::InvalidConfiguration {
                message: format!("TLS setup failed: {msg}"),
            },
            dashboard_api::Error::InvalidApiKey(msg) => CoreError::InvalidConfiguration {
                message: format!("invalid API key: {msg}"),
            },
            dashboard_api::Error::UnsupportedTarget { message } => {
                CoreError::UnsupportedTarget { message }
            }
            dashboard_api::Error::AnonymousAuthDisabled { message } => {
                CoreError::AuthenticationDisabled { message }
            }
            dashboard_api::Error::NotSignedIn => CoreError::Unauthenticated,
            dashboard_api::Error::Api {
                message, status, ..
            } => CoreError::RemoteService {
                message: match code {
                    Some(code) => format!("{message} [{code}]"),
                    None => message,
                },
                status: Some(status),
            },
            dashboard_api::Error::Deserialization { message, body: _ } => {
                CoreError::RemoteService {
                    message: format!("unexpected response: {message}"),
                    status: None,
                }
            }
        }
    }
}
