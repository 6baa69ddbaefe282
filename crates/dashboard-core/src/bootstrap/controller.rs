// ── Initialization controller ──
//
// Drives a cold-started client through the bootstrap phases, schedules
// retries through a `BackoffPolicy`, and publishes an immutable status
// snapshot on every transition and every countdown tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::config::BootstrapConfig;
use crate::connectivity::ConnectivityMonitor;
use crate::error::CoreError;
use crate::remote::{RemoteAvailabilityProbe, RemoteService, bounded};

use super::dependency::{AuthState, DependentService};
use super::status::{ErrorKind, InitError, InitializationStatus, Phase};

const STATUS_CHANNEL_SIZE: usize = 256;
const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

// ── Observable state ─────────────────────────────────────────────

/// Coarse lifecycle of the controller, observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    /// No run has been started.
    Idle,
    Running,
    Ready(AuthState),
    Failed(InitError),
    Cancelled,
}

/// How a single `run()`/`retry()` invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Ready(AuthState),
    Failed(InitError),
    /// Cancelled cooperatively; not an error.
    Cancelled,
}

impl RunOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn into_result(self) -> Result<AuthState, CoreError> {
        match self {
            Self::Ready(auth) => Ok(auth),
            Self::Failed(err) => Err(CoreError::Bootstrap(err)),
            Self::Cancelled => Err(CoreError::Cancelled),
        }
    }
}

enum AttemptResult {
    Ready(AuthState),
    Failed {
        error: InitError,
        progress: Option<f32>,
    },
    Cancelled,
}

// ── InitializationController ─────────────────────────────────────

/// Orchestrates the bootstrap sequence.
///
/// Cheaply cloneable. One controller per application root; a new
/// [`run()`](Self::run) or [`retry()`](Self::retry) cancels and waits out
/// any run already in flight.
#[derive(Clone)]
pub struct InitializationController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: BootstrapConfig,
    remote: Arc<dyn RemoteService>,
    monitor: ConnectivityMonitor,
    availability: RemoteAvailabilityProbe,
    dependencies: Vec<Arc<dyn DependentService>>,
    status_tx: broadcast::Sender<InitializationStatus>,
    latest: watch::Sender<Option<InitializationStatus>>,
    state: watch::Sender<BootstrapState>,
    /// Token of the run in flight, tagged with its generation.
    active: Mutex<Option<(u64, CancellationToken)>>,
    generation: Mutex<u64>,
    /// Serializes runs: a superseding run waits here for the old one to exit.
    run_lock: tokio::sync::Mutex<()>,
    completed: Mutex<HashSet<String>>,
}

impl InitializationController {
    /// Create a controller. Does NOT start anything; call
    /// [`run()`](Self::run) to bootstrap.
    pub fn new(
        config: BootstrapConfig,
        remote: Arc<dyn RemoteService>,
        monitor: ConnectivityMonitor,
    ) -> Self {
        Self::with_dependencies(config, remote, monitor, Vec::new())
    }

    /// Create a controller that also brings up `dependencies` during the
    /// `DependencyInit` phase, in order.
    pub fn with_dependencies(
        config: BootstrapConfig,
        remote: Arc<dyn RemoteService>,
        monitor: ConnectivityMonitor,
        dependencies: Vec<Arc<dyn DependentService>>,
    ) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_SIZE);
        let (latest, _) = watch::channel(None);
        let (state, _) = watch::channel(BootstrapState::Idle);
        let availability = RemoteAvailabilityProbe::new(Arc::clone(&remote), config.call_timeout);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                remote,
                monitor,
                availability,
                dependencies,
                status_tx,
                latest,
                state,
                active: Mutex::new(None),
                generation: Mutex::new(0),
                run_lock: tokio::sync::Mutex::new(()),
                completed: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.inner.config
    }

    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.inner.monitor
    }

    // ── Observation ──────────────────────────────────────────────

    /// Subscribe to status snapshots. Nothing is published before the
    /// first `run()`/`retry()`.
    pub fn statuses(&self) -> broadcast::Receiver<InitializationStatus> {
        self.inner.status_tx.subscribe()
    }

    /// The most recent status snapshot, if any run has started.
    pub fn latest_status(&self) -> Option<InitializationStatus> {
        self.inner.latest.borrow().clone()
    }

    pub fn state(&self) -> BootstrapState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<BootstrapState> {
        self.inner.state.subscribe()
    }

    /// Whether the last run reached the remote successfully.
    pub fn is_remote_ready(&self) -> bool {
        matches!(*self.inner.state.borrow(), BootstrapState::Ready(_))
    }

    /// Authentication outcome of the last successful run.
    pub fn auth_state(&self) -> Option<AuthState> {
        match &*self.inner.state.borrow() {
            BootstrapState::Ready(auth) => Some(auth.clone()),
            _ => None,
        }
    }

    // ── Control ──────────────────────────────────────────────────

    /// Bootstrap with the configured retry policy.
    pub async fn run(&self) -> RunOutcome {
        self.execute(self.inner.config.retry.clone()).await
    }

    /// Restart from attempt 1, optionally with a different policy.
    pub async fn retry(&self, policy: Option<BackoffPolicy>) -> RunOutcome {
        info!(override_policy = policy.is_some(), "bootstrap retry requested");
        let policy = policy.unwrap_or_else(|| self.inner.config.retry.clone());
        self.execute(policy).await
    }

    /// Cancel the run in flight. No-op when nothing is running.
    pub fn cancel(&self) {
        let active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((generation, token)) = active {
            debug!(generation, "cancelling bootstrap run");
            token.cancel();
        }
    }

    /// Cancel any run and stop the connectivity monitor.
    pub fn shutdown(&self) {
        self.cancel();
        self.inner.monitor.stop();
    }

    // ── Run orchestration ────────────────────────────────────────

    async fn execute(&self, policy: BackoffPolicy) -> RunOutcome {
        let token = CancellationToken::new();
        let generation = {
            let mut generation = self
                .inner
                .generation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *generation += 1;
            *generation
        };
        let previous = self
            .inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace((generation, token.clone()));
        if let Some((_, previous)) = previous {
            previous.cancel();
        }

        let _guard = self.inner.run_lock.lock().await;
        if token.is_cancelled() {
            // Superseded or cancelled while waiting for the previous run.
            return RunOutcome::Cancelled;
        }

        self.inner.state.send_replace(BootstrapState::Running);
        let outcome = self.drive(&policy, &token).await;

        {
            let mut active = self.inner.active.lock().unwrap_or_else(PoisonError::into_inner);
            if active.as_ref().is_some_and(|(g, _)| *g == generation) {
                *active = None;
            }
        }
        let state = match &outcome {
            RunOutcome::Ready(auth) => BootstrapState::Ready(auth.clone()),
            RunOutcome::Failed(err) => BootstrapState::Failed(err.clone()),
            RunOutcome::Cancelled => BootstrapState::Cancelled,
        };
        self.inner.state.send_replace(state);
        outcome
    }

    async fn drive(&self, policy: &BackoffPolicy, token: &CancellationToken) -> RunOutcome {
        let max = policy.max_attempts();
        let mut attempt = 1;

        loop {
            match self.attempt(attempt, max, token).await {
                AttemptResult::Ready(auth) => {
                    self.emit(InitializationStatus::phase(Phase::Success, attempt, max));
                    info!(attempt, "bootstrap succeeded");
                    self.on_success().await;
                    return RunOutcome::Ready(auth);
                }
                AttemptResult::Cancelled => {
                    info!(attempt, "bootstrap cancelled");
                    return RunOutcome::Cancelled;
                }
                AttemptResult::Failed { error, progress } => {
                    if !error.kind.is_retryable() {
                        warn!(attempt, kind = %error.kind, error = %error.message, "bootstrap failed");
                        self.emit(InitializationStatus::failed(error.clone(), attempt, max, progress, false));
                        return RunOutcome::Failed(error);
                    }

                    let next = attempt + 1;
                    if !policy.should_retry(next) {
                        let terminal = InitError::exhausted(attempt, &error);
                        warn!(attempt, error = %error.message, "bootstrap retries exhausted");
                        self.emit(InitializationStatus::failed(terminal.clone(), attempt, max, progress, false));
                        return RunOutcome::Failed(terminal);
                    }

                    let delay = policy.delay(next);
                    warn!(
                        attempt,
                        kind = %error.kind,
                        error = %error.message,
                        delay_ms = delay.as_millis(),
                        "bootstrap attempt failed, retrying"
                    );
                    self.emit(InitializationStatus::failed(error, attempt, max, progress, true));
                    if !self.countdown(delay, next, max, token).await {
                        info!(attempt, "bootstrap cancelled during retry countdown");
                        return RunOutcome::Cancelled;
                    }
                    attempt = next;
                }
            }
        }
    }

    /// Emit `Retrying` once per tick until `delay` elapses.
    /// Returns `false` if cancelled.
    async fn countdown(
        &self,
        delay: Duration,
        next_attempt: u32,
        max: u32,
        token: &CancellationToken,
    ) -> bool {
        let mut remaining = delay;
        loop {
            if token.is_cancelled() {
                return false;
            }
            self.emit(InitializationStatus::retrying(remaining, next_attempt, max));
            if remaining.is_zero() {
                return true;
            }

            let step = remaining.min(COUNTDOWN_TICK);
            tokio::select! {
                biased;
                () = token.cancelled() => return false,
                () = tokio::time::sleep(step) => {}
            }
            remaining = remaining.saturating_sub(step);
            if remaining.is_zero() {
                return !token.is_cancelled();
            }
        }
    }

    // ── Phases ───────────────────────────────────────────────────

    async fn attempt(&self, attempt: u32, max: u32, token: &CancellationToken) -> AttemptResult {
        if !self.enter(Phase::NetworkCheck, attempt, max, token) {
            return AttemptResult::Cancelled;
        }
        if let Err(e) = self.check_network().await {
            return fail(Phase::NetworkCheck, &e, token);
        }

        if !self.enter(Phase::ConfigValidation, attempt, max, token) {
            return AttemptResult::Cancelled;
        }
        if let Err(e) = self.inner.config.validate() {
            return fail(Phase::ConfigValidation, &e, token);
        }

        if !self.enter(Phase::RemoteInit, attempt, max, token) {
            return AttemptResult::Cancelled;
        }
        let timeout = self.inner.config.call_timeout;
        if let Err(e) = bounded(
            timeout,
            "remote initialization",
            self.inner.remote.initialize(&self.inner.config.remote),
        )
        .await
        {
            return fail(Phase::RemoteInit, &e, token);
        }

        if !self.enter(Phase::Authentication, attempt, max, token) {
            return AttemptResult::Cancelled;
        }
        let auth = match self.authenticate().await {
            Ok(auth) => auth,
            Err(e) => return fail(Phase::Authentication, &e, token),
        };

        if !self.enter(Phase::DependencyInit, attempt, max, token) {
            return AttemptResult::Cancelled;
        }
        if let Err(e) = self.init_dependencies(&auth).await {
            return fail(Phase::DependencyInit, &e, token);
        }

        if token.is_cancelled() {
            return AttemptResult::Cancelled;
        }
        AttemptResult::Ready(auth)
    }

    /// Check cancellation and publish the phase entry.
    fn enter(&self, phase: Phase, attempt: u32, max: u32, token: &CancellationToken) -> bool {
        if token.is_cancelled() {
            return false;
        }
        info!(attempt, %phase, "entering bootstrap phase");
        self.emit(InitializationStatus::phase(phase, attempt, max));
        true
    }

    async fn check_network(&self) -> Result<(), CoreError> {
        // A zero budget would time out every ping and retry forever.
        if self.inner.config.call_timeout.is_zero() {
            return Err(CoreError::config("call timeout must be greater than zero"));
        }
        let state = self
            .inner
            .monitor
            .refresh()
            .await
            .map_err(|e| CoreError::network(e.to_string()))?;
        if state.is_offline() {
            return Err(CoreError::network("host reports no network connectivity"));
        }
        self.inner.availability.check().await?;
        Ok(())
    }

    async fn authenticate(&self) -> Result<AuthState, CoreError> {
        if let Some(identity) = self.inner.remote.current_identity() {
            debug!(uid = %identity.uid, "reusing cached identity");
            return Ok(AuthState::Authenticated {
                uid: identity.uid,
                anonymous: identity.anonymous,
            });
        }

        if !self.inner.config.remote.anonymous_auth {
            warn!("no cached identity and anonymous sign-in is disabled; continuing degraded");
            return Ok(AuthState::Degraded {
                reason: "anonymous sign-in disabled by configuration".into(),
            });
        }

        let timeout = self.inner.config.call_timeout;
        match bounded(timeout, "anonymous sign-in", self.inner.remote.sign_in_anonymously()).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed in anonymously");
                Ok(AuthState::Authenticated {
                    uid: identity.uid,
                    anonymous: identity.anonymous,
                })
            }
            Err(CoreError::AuthenticationDisabled { message }) => {
                warn!(reason = %message, "anonymous sign-in unavailable; continuing degraded");
                Ok(AuthState::Degraded { reason: message })
            }
            Err(e) => Err(e),
        }
    }

    async fn init_dependencies(&self, auth: &AuthState) -> Result<(), CoreError> {
        let timeout = self.inner.config.call_timeout;
        for dependency in &self.inner.dependencies {
            let name = dependency.name();
            if self.is_completed(name) {
                debug!(dependency = name, "already initialized, skipping");
                continue;
            }
            if dependency.requires_identity() && !auth.is_authenticated() {
                warn!(dependency = name, "skipping: requires an identity under degraded auth");
                continue;
            }

            bounded(timeout, name, dependency.initialize(auth)).await?;
            debug!(dependency = name, "dependency initialized");
            self.inner
                .completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_owned());
        }
        Ok(())
    }

    fn is_completed(&self, name: &str) -> bool {
        self.inner
            .completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }

    async fn on_success(&self) {
        let monitor = &self.inner.monitor;
        monitor.start();
        match monitor.refresh().await {
            Ok(state) => debug!(online = state.is_online(), "initial connectivity classified"),
            Err(e) => warn!(error = %e, "initial connectivity classification failed"),
        }
    }

    fn emit(&self, status: InitializationStatus) {
        self.inner.latest.send_replace(Some(status.clone()));
        // Zero subscribers is fine.
        let _ = self.inner.status_tx.send(status);
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        let active = self.active.get_mut().unwrap_or_else(PoisonError::into_inner).take();
        if let Some((_, token)) = active {
            token.cancel();
        }
        self.monitor.stop();
    }
}

/// Translate a phase failure into the bootstrap taxonomy.
fn classify(phase: Phase, err: &CoreError) -> InitError {
    let kind = match (phase, err.kind()) {
        (Phase::ConfigValidation, _) | (_, ErrorKind::InvalidConfiguration) => {
            ErrorKind::InvalidConfiguration
        }
        (Phase::NetworkCheck, _) => ErrorKind::NetworkUnavailable,
        (_, kind) => kind,
    };
    InitError::new(kind, err.to_string()).with_detail(format!("during {phase}"))
}

fn fail(phase: Phase, err: &CoreError, token: &CancellationToken) -> AttemptResult {
    if token.is_cancelled() {
        return AttemptResult::Cancelled;
    }
    AttemptResult::Failed {
        error: classify(phase, err),
        progress: phase.progress(),
    }
}
