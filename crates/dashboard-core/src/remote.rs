// ── Remote service contract ──
//
// The three session operations the bootstrap sequence depends on, plus a
// cheap health round-trip. `RemoteClient` is the production implementation;
// tests substitute scripted fakes.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use dashboard_api::models::InitRequest;
use dashboard_api::{Identity, RemoteClient};

use crate::config::RemoteConfig;
use crate::error::CoreError;

/// Session-level operations against the remote backend.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Register this client with the backend.
    async fn initialize(&self, config: &RemoteConfig) -> Result<(), CoreError>;

    /// The cached identity, if already signed in.
    fn current_identity(&self) -> Option<Identity>;

    /// Obtain (and cache) an anonymous identity.
    async fn sign_in_anonymously(&self) -> Result<Identity, CoreError>;

    /// Cheap round-trip proving the backend answers.
    async fn ping(&self) -> Result<(), CoreError>;
}

#[async_trait]
impl RemoteService for RemoteClient {
    async fn initialize(&self, config: &RemoteConfig) -> Result<(), CoreError> {
        let request = InitRequest {
            project_id: config.project_id.clone(),
            target: config.target.clone(),
            client_version: env!("CARGO_PKG_VERSION").to_owned(),
        };
        let response = RemoteClient::initialize(self, &request).await?;
        debug!(session_id = %response.session_id, "remote session established");
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        RemoteClient::current_identity(self)
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, CoreError> {
        Ok(RemoteClient::sign_in_anonymously(self).await?)
    }

    async fn ping(&self) -> Result<(), CoreError> {
        Ok(RemoteClient::ping(self).await?)
    }
}

/// Confirms the remote is reachable, beyond raw network presence.
#[derive(Clone)]
pub struct RemoteAvailabilityProbe {
    remote: Arc<dyn RemoteService>,
    timeout: Duration,
}

impl RemoteAvailabilityProbe {
    pub fn new(remote: Arc<dyn RemoteService>, timeout: Duration) -> Self {
        Self { remote, timeout }
    }

    /// Ping the remote; returns the round-trip latency.
    pub async fn check(&self) -> Result<Duration, CoreError> {
        let started = Instant::now();
        bounded(self.timeout, "remote ping", self.remote.ping()).await?;
        let latency = started.elapsed();
        debug!(latency_ms = latency.as_millis(), "remote reachable");
        Ok(latency)
    }
}

/// Bound `fut` by `timeout`; elapsing is a network-class failure.
pub(crate) async fn bounded<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::network(format!(
            "{what} timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}
