// Backend HTTP client
//
// Wraps `reqwest::Client` with base-URL path joining, error-envelope
// decoding, and the cached signed-in identity. Session and domain
// endpoints are implemented as inherent methods in `session.rs` and
// `domains.rs` to keep this module focused on transport mechanics.

use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorEnvelope;
use crate::transport::TransportConfig;

/// A signed-in backend identity.
#[derive(Debug, Clone)]
pub struct Identity {
    pub uid: String,
    pub token: SecretString,
    pub anonymous: bool,
}

/// Raw HTTP client for the dashboard backend.
///
/// All methods return decoded payloads; non-2xx responses are turned into
/// [`Error::Api`] (or a more specific variant when the backend error code
/// is recognised) before the caller sees them.
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: Url,
    identity: RwLock<Option<Identity>>,
}

impl RemoteClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `https://api.example.com`);
    /// every endpoint lives under `/v1/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            identity: RwLock::new(None),
        }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Identity cache ───────────────────────────────────────────────

    /// The identity cached by the last successful sign-in, if any.
    pub fn current_identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store_identity(&self, identity: Identity) {
        debug!(uid = %identity.uid, anonymous = identity.anonymous, "storing identity");
        *self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }

    /// Forget the cached identity.
    pub fn sign_out(&self) {
        *self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn require_identity(&self) -> Result<Identity, Error> {
        self.current_identity().ok_or(Error::NotSignedIn)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/v1/{path}`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/v1/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        bearer: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("GET {}", url);
        let builder = with_bearer(self.http.get(url), bearer);
        let resp = builder.send().await?;
        decode(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        bearer: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let builder = with_bearer(self.http.post(url).json(body), bearer);
        let resp = builder.send().await?;
        decode(resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
        bearer: Option<&SecretString>,
    ) -> Result<T, Error> {
        debug!("PATCH {}", url);
        let builder = with_bearer(self.http.patch(url).json(body), bearer);
        let resp = builder.send().await?;
        decode(resp).await
    }

    /// DELETE, ignoring any response body.
    pub(crate) async fn delete(&self, url: Url, bearer: Option<&SecretString>) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let builder = with_bearer(self.http.delete(url), bearer);
        let resp = builder.send().await?;
        check_status(resp).await.map(|_| ())
    }

    /// GET, ignoring any response body. Used by health checks.
    pub(crate) async fn get_empty(&self, url: Url) -> Result<(), Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        check_status(resp).await.map(|_| ())
    }
}

fn with_bearer(
    builder: reqwest::RequestBuilder,
    bearer: Option<&SecretString>,
) -> reqwest::RequestBuilder {
    match bearer {
        Some(token) => builder.bearer_auth(token.expose_secret()),
        None => builder,
    }
}

/// Map a non-2xx response into an [`Error`], passing successful ones through.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => (
            envelope.error.code,
            envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {status}")),
        ),
        Err(_) => (None, format!("HTTP {status}: {}", preview(&body))),
    };

    Err(match code.as_deref() {
        Some("unsupported-target") => Error::UnsupportedTarget { message },
        Some("anonymous-auth-disabled" | "operation-not-allowed") => {
            Error::AnonymousAuthDisabled { message }
        }
        _ => Error::Api {
            message,
            code,
            status: status.as_u16(),
        },
    })
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map_or(body.len(), |(idx, _)| idx);
    &body[..end]
}
