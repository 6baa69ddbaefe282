// ── Repository switchboard ──
//
// Owns the live/local implementation pair of every data domain and swaps
// all of them together. The mode and the bound implementations live in one
// `RepositorySet` behind an `ArcSwapOption`, so readers can never observe a
// partial mix; mode flips are serialized by an async mutex.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use strum::IntoEnumIterator;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bootstrap::InitializationController;
use crate::connectivity::{ConnectivityState, ConnectivityStream};
use crate::error::CoreError;
use crate::repository::{
    Domain, FeedRepository, Mode, NewsRepository, RepositoryFactories, RepositorySet,
    StreamRepository, TodoRepository, WeatherRepository,
};

/// Availability of one domain under the committed mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainStatus {
    pub domain: Domain,
    pub mode: Mode,
    pub available: bool,
    pub reason: Option<String>,
}

/// Binds every data domain to the live or local implementation family.
///
/// Cheaply cloneable. Nothing is bound until [`initialize()`](Self::initialize);
/// accessors return [`CoreError::NotInitialized`] before that.
#[derive(Clone)]
pub struct RepositorySwitchboard {
    inner: Arc<SwitchboardInner>,
}

struct SwitchboardInner {
    controller: InitializationController,
    factories: RepositoryFactories,
    bound: ArcSwapOption<RepositorySet>,
    mode: watch::Sender<Option<Mode>>,
    switch_lock: tokio::sync::Mutex<()>,
    failover: Mutex<Option<CancellationToken>>,
}

impl RepositorySwitchboard {
    pub fn new(controller: InitializationController, factories: RepositoryFactories) -> Self {
        let (mode, _) = watch::channel(None);
        Self {
            inner: Arc::new(SwitchboardInner {
                controller,
                factories,
                bound: ArcSwapOption::empty(),
                mode,
                switch_lock: tokio::sync::Mutex::new(()),
                failover: Mutex::new(None),
            }),
        }
    }

    pub fn controller(&self) -> &InitializationController {
        &self.inner.controller
    }

    // ── Mode ─────────────────────────────────────────────────────

    /// The committed mode, or `None` before `initialize()`.
    pub fn mode(&self) -> Option<Mode> {
        self.inner.bound.load_full().map(|set| set.mode)
    }

    /// Watch mode changes. Only actual flips are published.
    pub fn subscribe_mode(&self) -> watch::Receiver<Option<Mode>> {
        self.inner.mode.subscribe()
    }

    /// Pick the starting mode from the controller and monitor, and bind it.
    ///
    /// Local if the remote was never reached, or if the host is offline and
    /// local fallback is enabled. Live otherwise.
    pub async fn initialize(&self) -> Result<Mode, CoreError> {
        let _guard = self.inner.switch_lock.lock().await;
        let controller = &self.inner.controller;

        let mode = if !controller.is_remote_ready() {
            info!("remote was never reached; starting local");
            Mode::Local
        } else if controller.config().local_fallback && controller.monitor().current_state().is_offline() {
            info!("host is offline; starting local");
            Mode::Local
        } else {
            Mode::Live
        };

        self.commit(mode)?;
        Ok(mode)
    }

    /// Bind every domain to its local implementation.
    ///
    /// Idempotent: returns `Ok(false)` without rebuilding when already local.
    pub async fn switch_to_local(&self) -> Result<bool, CoreError> {
        let _guard = self.inner.switch_lock.lock().await;
        if self.mode() == Some(Mode::Local) {
            debug!("already local");
            return Ok(false);
        }
        self.commit(Mode::Local)?;
        Ok(true)
    }

    /// Re-run the full bootstrap and, if it succeeds, bind live.
    ///
    /// On failure the switchboard stays (or becomes) local and the bootstrap
    /// error is returned.
    pub async fn switch_to_live(&self) -> Result<(), CoreError> {
        let _guard = self.inner.switch_lock.lock().await;
        if self.mode() == Some(Mode::Live) {
            debug!("already live");
            return Ok(());
        }

        info!("re-running bootstrap before going live");
        match self.inner.controller.run().await.into_result() {
            Ok(_) => self.commit(Mode::Live),
            Err(e) => {
                warn!(error = %e, "cannot go live; staying local");
                if self.mode().is_none()
                    && let Err(commit_err) = self.commit(Mode::Local)
                {
                    warn!(error = %commit_err, "local fallback bind failed");
                }
                Err(e)
            }
        }
    }

    /// Build a full set for `mode` and publish it. The prior set stays
    /// bound if construction fails.
    fn commit(&self, mode: Mode) -> Result<(), CoreError> {
        let authenticated = self
            .inner
            .controller
            .auth_state()
            .is_some_and(|auth| auth.is_authenticated());

        let set = RepositorySet::build(mode, &self.inner.factories, authenticated).map_err(|e| {
            warn!(%mode, error = %e, "repository construction failed; keeping prior mode");
            CoreError::SwitchFailed {
                message: format!("building {mode} repositories: {e}"),
            }
        })?;

        self.inner.bound.store(Some(Arc::new(set)));
        let flipped = self.inner.mode.send_if_modified(|current| {
            if *current == Some(mode) {
                false
            } else {
                *current = Some(mode);
                true
            }
        });
        if flipped {
            info!(%mode, authenticated, "repository mode switched");
        } else {
            debug!(%mode, "repositories rebuilt");
        }
        Ok(())
    }

    // ── Accessors ────────────────────────────────────────────────

    fn current(&self) -> Result<Arc<RepositorySet>, CoreError> {
        self.inner.bound.load_full().ok_or(CoreError::NotInitialized)
    }

    pub fn todos(&self) -> Result<Arc<dyn TodoRepository>, CoreError> {
        self.current()?.todo()
    }

    pub fn weather(&self) -> Result<Arc<dyn WeatherRepository>, CoreError> {
        self.current()?.weather()
    }

    pub fn news(&self) -> Result<Arc<dyn NewsRepository>, CoreError> {
        self.current()?.news()
    }

    pub fn feeds(&self) -> Result<Arc<dyn FeedRepository>, CoreError> {
        self.current()?.feeds()
    }

    pub fn streams(&self) -> Result<Arc<dyn StreamRepository>, CoreError> {
        self.current()?.streams()
    }

    /// Per-domain availability under the committed mode.
    pub fn domain_status(&self) -> Result<Vec<DomainStatus>, CoreError> {
        let set = self.current()?;
        Ok(Domain::iter()
            .map(|domain| {
                let available = set.is_available(domain);
                DomainStatus {
                    domain,
                    mode: set.mode,
                    available,
                    reason: (!available).then(|| "authentication required".to_owned()),
                }
            })
            .collect())
    }

    // ── Automatic failover ───────────────────────────────────────

    /// Follow connectivity flips: go local when the host drops offline,
    /// back live when it returns. No-op if already running.
    pub fn start_auto_failover(&self) {
        let mut slot = self.inner.failover.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let changes = self.inner.controller.monitor().subscribe();
        tokio::spawn(failover_task(Arc::downgrade(&self.inner), changes, cancel.clone()));
        *slot = Some(cancel);
        debug!("automatic failover started");
    }

    /// Stop failover, cancel any bootstrap run, and stop the monitor.
    pub fn shutdown(&self) {
        let failover = self
            .inner
            .failover
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(cancel) = failover {
            cancel.cancel();
        }
        self.inner.controller.shutdown();
    }

    async fn on_connectivity(&self, state: ConnectivityState) {
        let config = self.inner.controller.config();
        match (state.is_online(), self.mode()) {
            (false, Some(Mode::Live)) if config.local_fallback => match self.switch_to_local().await {
                Ok(_) => info!("connectivity lost; switched to local"),
                Err(e) => warn!(error = %e, "failover to local failed"),
            },
            (true, Some(Mode::Local)) if config.auto_restore => {
                if let Err(e) = self.switch_to_live().await {
                    warn!(error = %e, "restore to live failed");
                }
            }
            (online, mode) => debug!(online, ?mode, "connectivity change needs no switch"),
        }
    }
}

impl Drop for SwitchboardInner {
    fn drop(&mut self) {
        let failover = self.failover.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(cancel) = failover {
            cancel.cancel();
        }
    }
}

/// Holds the switchboard weakly so dropping every handle ends the task.
async fn failover_task(
    switchboard: Weak<SwitchboardInner>,
    mut changes: ConnectivityStream,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            change = changes.changed() => {
                let Some(state) = change else { break };
                let Some(inner) = switchboard.upgrade() else { break };
                RepositorySwitchboard { inner }.on_connectivity(state).await;
            }
        }
    }
    debug!("automatic failover stopped");
}
