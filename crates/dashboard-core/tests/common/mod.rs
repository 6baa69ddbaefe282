// Scripted fakes shared by the core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::broadcast;
use url::Url;

use dashboard_api::RemoteClient;
use dashboard_core::repository::{
    LiveFeeds, LiveNews, LiveStreams, LiveTodos, LiveWeather, LocalFeeds, LocalNews,
    LocalStreams, LocalTodos, LocalWeather,
};
use dashboard_core::{
    AuthState, BackoffPolicy, BootstrapConfig, ConnectivityMonitor, ConnectivityProbe, CoreError,
    DependentService, DomainFactory, FeedRepository, Identity, InitializationController,
    InitializationStatus, InterfaceKind, LocalStore, NewsRepository, ProbeError, ProbeReading,
    RemoteConfig, RepositoryFactories, StreamRepository, TodoRepository, WeatherRepository,
};

// ── Remote ──────────────────────────────────────────────────────────

/// One scripted answer to `initialize()`.
#[derive(Debug, Clone, Copy)]
pub enum InitStep {
    Ok,
    NetworkDown,
    ServerError,
    Unsupported,
    /// Never answers; relies on the controller's call timeout.
    Hang,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignIn {
    Allow,
    Disabled,
}

pub struct FakeRemote {
    init_script: Mutex<VecDeque<InitStep>>,
    sign_in: Mutex<SignIn>,
    identity: Mutex<Option<Identity>>,
    ping_ok: AtomicBool,
    pub init_calls: AtomicU32,
    pub sign_in_calls: AtomicU32,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            init_script: Mutex::new(VecDeque::new()),
            sign_in: Mutex::new(SignIn::Allow),
            identity: Mutex::new(None),
            ping_ok: AtomicBool::new(true),
            init_calls: AtomicU32::new(0),
            sign_in_calls: AtomicU32::new(0),
        }
    }

    /// Queue answers for successive `initialize()` calls; `Ok` once drained.
    pub fn script_init(&self, steps: &[InitStep]) {
        self.init_script.lock().unwrap().extend(steps.iter().copied());
    }

    pub fn set_sign_in(&self, mode: SignIn) {
        *self.sign_in.lock().unwrap() = mode;
    }

    pub fn set_ping_ok(&self, ok: bool) {
        self.ping_ok.store(ok, Ordering::SeqCst);
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl dashboard_core::RemoteService for FakeRemote {
    async fn initialize(&self, _config: &RemoteConfig) -> Result<(), CoreError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let step = self.init_script.lock().unwrap().pop_front().unwrap_or(InitStep::Ok);
        match step {
            InitStep::Ok => Ok(()),
            InitStep::NetworkDown => Err(CoreError::NetworkUnavailable {
                reason: "connection reset".into(),
            }),
            InitStep::ServerError => Err(CoreError::RemoteService {
                message: "maintenance".into(),
                status: Some(503),
            }),
            InitStep::Unsupported => Err(CoreError::UnsupportedTarget {
                message: "no build for this platform".into(),
            }),
            InitStep::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }

    fn current_identity(&self) -> Option<Identity> {
        self.identity.lock().unwrap().clone()
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, CoreError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.sign_in.lock().unwrap();
        match mode {
            SignIn::Allow => {
                let identity = Identity {
                    uid: "anon-1".into(),
                    token: SecretString::from("token".to_owned()),
                    anonymous: true,
                };
                *self.identity.lock().unwrap() = Some(identity.clone());
                Ok(identity)
            }
            SignIn::Disabled => Err(CoreError::AuthenticationDisabled {
                message: "anonymous sign-in disabled for project".into(),
            }),
        }
    }

    async fn ping(&self) -> Result<(), CoreError> {
        // Like a real round trip, never answer on the first poll.
        tokio::task::yield_now().await;
        if self.ping_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CoreError::NetworkUnavailable {
                reason: "remote unreachable".into(),
            })
        }
    }
}

// ── Connectivity ────────────────────────────────────────────────────

/// Probe whose answer is flipped by the test.
pub struct FakeProbe {
    online: AtomicBool,
    /// Report offline for this many checks before honouring `online`.
    offline_checks: AtomicU32,
    pub checks: AtomicU32,
}

impl FakeProbe {
    pub fn online() -> Self {
        Self {
            online: AtomicBool::new(true),
            offline_checks: AtomicU32::new(0),
            checks: AtomicU32::new(0),
        }
    }

    pub fn offline() -> Self {
        let probe = Self::online();
        probe.set_online(false);
        probe
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn offline_for(&self, checks: u32) {
        self.offline_checks.store(checks, Ordering::SeqCst);
    }

    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn check(&self) -> Result<ProbeReading, ProbeError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let forced_offline = self
            .offline_checks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        let online = !forced_offline && self.online.load(Ordering::SeqCst);
        Ok(if online {
            ProbeReading::Many(vec![InterfaceKind::Wifi, InterfaceKind::Vpn])
        } else {
            ProbeReading::Single(InterfaceKind::None)
        })
    }
}

// ── Dependent services ──────────────────────────────────────────────

pub struct RecordingService {
    name: &'static str,
    requires_identity: bool,
    failures_left: AtomicU32,
    pub calls: AtomicU32,
}

impl RecordingService {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            requires_identity: false,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn requiring_identity(mut self) -> Self {
        self.requires_identity = true;
        self
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DependentService for RecordingService {
    fn name(&self) -> &str {
        self.name
    }

    fn requires_identity(&self) -> bool {
        self.requires_identity
    }

    async fn initialize(&self, _auth: &AuthState) -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(CoreError::RemoteService {
                message: format!("{} backend busy", self.name),
                status: Some(503),
            });
        }
        Ok(())
    }
}

// ── Repository factories ────────────────────────────────────────────

/// Standard repositories, with build counting and injectable failure.
pub struct TestFactory {
    client: Arc<RemoteClient>,
    pub store: Arc<LocalStore>,
    pub fail_local: AtomicBool,
    /// Counts todo constructions: one per `RepositorySet` build.
    pub builds: AtomicU32,
}

impl TestFactory {
    pub fn new() -> Self {
        let client = RemoteClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://127.0.0.1:9").unwrap(),
        );
        Self {
            client: Arc::new(client),
            store: Arc::new(LocalStore::with_fixtures()),
            fail_local: AtomicBool::new(false),
            builds: AtomicU32::new(0),
        }
    }

    pub fn builds(&self) -> u32 {
        self.builds.load(Ordering::SeqCst)
    }

    fn check_local(&self) -> Result<(), CoreError> {
        if self.fail_local.load(Ordering::SeqCst) {
            Err(CoreError::Internal("local store unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl DomainFactory<dyn TodoRepository> for TestFactory {
    fn live(&self) -> Result<Arc<dyn TodoRepository>, CoreError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(LiveTodos::new(Arc::clone(&self.client))))
    }

    fn local(&self) -> Result<Arc<dyn TodoRepository>, CoreError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.check_local()?;
        Ok(Arc::new(LocalTodos::new(Arc::clone(&self.store))))
    }
}

macro_rules! test_factory {
    ($trait:ident, $live:ident, $local:ident) => {
        impl DomainFactory<dyn $trait> for TestFactory {
            fn live(&self) -> Result<Arc<dyn $trait>, CoreError> {
                Ok(Arc::new($live::new(Arc::clone(&self.client))))
            }

            fn local(&self) -> Result<Arc<dyn $trait>, CoreError> {
                self.check_local()?;
                Ok(Arc::new($local::new(Arc::clone(&self.store))))
            }
        }
    };
}

test_factory!(WeatherRepository, LiveWeather, LocalWeather);
test_factory!(NewsRepository, LiveNews, LocalNews);
test_factory!(FeedRepository, LiveFeeds, LocalFeeds);
test_factory!(StreamRepository, LiveStreams, LocalStreams);

pub fn factories(factory: &Arc<TestFactory>) -> RepositoryFactories {
    RepositoryFactories {
        todo: factory.clone(),
        weather: factory.clone(),
        news: factory.clone(),
        feeds: factory.clone(),
        streams: factory.clone(),
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub fn config(policy: BackoffPolicy) -> BootstrapConfig {
    let mut config = BootstrapConfig::new(RemoteConfig::new(
        Url::parse("https://api.example.test").unwrap(),
        "home-dashboard",
    ));
    config.retry = policy;
    config
}

pub struct Harness {
    pub remote: Arc<FakeRemote>,
    pub probe: Arc<FakeProbe>,
    pub monitor: ConnectivityMonitor,
    pub controller: InitializationController,
}

impl Harness {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with(config(policy), FakeProbe::online(), Vec::new())
    }

    pub fn with(
        config: BootstrapConfig,
        probe: FakeProbe,
        dependencies: Vec<Arc<dyn DependentService>>,
    ) -> Self {
        let remote = Arc::new(FakeRemote::new());
        let probe = Arc::new(probe);
        let monitor = ConnectivityMonitor::new(probe.clone(), Duration::from_secs(3600));
        let controller = InitializationController::with_dependencies(
            config,
            remote.clone(),
            monitor.clone(),
            dependencies,
        );
        Self {
            remote,
            probe,
            monitor,
            controller,
        }
    }
}

/// Everything already buffered on a status subscription.
pub fn drain(rx: &mut broadcast::Receiver<InitializationStatus>) -> Vec<InitializationStatus> {
    let mut out = Vec::new();
    while let Ok(status) = rx.try_recv() {
        out.push(status);
    }
    out
}

/// A 5s/10s policy with no jitter, for countdown tests.
pub fn slow_policy(max_attempts: u32) -> BackoffPolicy {
    BackoffPolicy::new(
        Duration::from_secs(5),
        Duration::from_secs(10),
        2.0,
        0.0,
        max_attempts,
    )
    .unwrap()
}
