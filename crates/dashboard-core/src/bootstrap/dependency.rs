use async_trait::async_trait;
use serde::Serialize;

use crate::error::CoreError;

/// Authentication outcome of a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthState {
    /// A signed-in (possibly anonymous) identity is available.
    Authenticated { uid: String, anonymous: bool },
    /// Sign-in was unavailable; identity-bound domains stay offline.
    Degraded { reason: String },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// A service brought up during the `DependencyInit` phase.
///
/// Once a service initializes successfully it is not re-run by later
/// attempts of the same controller.
#[async_trait]
pub trait DependentService: Send + Sync {
    /// Stable name, used for logging and completion tracking.
    fn name(&self) -> &str;

    /// Services needing an identity are skipped under degraded auth.
    fn requires_identity(&self) -> bool {
        false
    }

    async fn initialize(&self, auth: &AuthState) -> Result<(), CoreError>;
}
