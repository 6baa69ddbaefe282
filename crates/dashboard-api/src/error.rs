use thiserror::Error;

/// Top-level error type for the `dashboard-api` crate.
///
/// Covers every failure mode of the backend surface: transport, session
/// bootstrap, anonymous sign-in, and domain reads. `dashboard-core` maps
/// these into its bootstrap error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The configured API key cannot be sent as a header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Session ─────────────────────────────────────────────────────
    /// The backend refuses to serve this client target (platform/build).
    #[error("Unsupported target: {message}")]
    UnsupportedTarget { message: String },

    /// Anonymous sign-in is switched off on the backend project.
    #[error("Anonymous authentication is disabled: {message}")]
    AnonymousAuthDisabled { message: String },

    /// A call needed a signed-in identity and none was available.
    #[error("No signed-in identity")]
    NotSignedIn,

    // ── Backend ─────────────────────────────────────────────────────
    /// Structured error returned by the backend.
    #[error("Backend error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the backend error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
