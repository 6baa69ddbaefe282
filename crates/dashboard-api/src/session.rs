// Session bootstrap and anonymous sign-in endpoints.

use secrecy::SecretString;
use tracing::info;

use crate::client::{Identity, RemoteClient};
use crate::error::Error;
use crate::models::{InitRequest, InitResponse, SignInResponse};

impl RemoteClient {
    /// Register this client with the backend project.
    ///
    /// `POST /v1/init`. A backend that does not serve the requested
    /// target answers with code `unsupported-target`, surfaced as
    /// [`Error::UnsupportedTarget`].
    pub async fn initialize(&self, request: &InitRequest) -> Result<InitResponse, Error> {
        let url = self.url("init")?;
        let response: InitResponse = self.post(url, request, None).await?;
        info!(session_id = %response.session_id, "backend session initialized");
        Ok(response)
    }

    /// Cheap availability round-trip: `GET /v1/health`.
    pub async fn ping(&self) -> Result<(), Error> {
        let url = self.url("health")?;
        self.get_empty(url).await
    }

    /// Sign in without credentials: `POST /v1/auth/anonymous`.
    ///
    /// Caches the resulting identity so later calls to
    /// [`current_identity`](Self::current_identity) return it.
    pub async fn sign_in_anonymously(&self) -> Result<Identity, Error> {
        let url = self.url("auth/anonymous")?;
        let response: SignInResponse = self.post(url, &serde_json::json!({}), None).await?;

        let identity = Identity {
            uid: response.uid,
            token: SecretString::from(response.token),
            anonymous: response.anonymous,
        };
        self.store_identity(identity.clone());
        Ok(identity)
    }
}
