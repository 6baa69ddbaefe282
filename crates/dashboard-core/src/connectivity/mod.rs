// ── Host connectivity monitor ──
//
// Normalizes whatever the platform probe reports into one online/offline
// boolean and publishes it edge-triggered through a `watch` channel.

mod stream;
mod tcp;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::Serialize;
use strum::Display;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub use stream::{ConnectivityStream, ConnectivityWatchStream};
pub use tcp::TcpProbe;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

// ── Probe contract ───────────────────────────────────────────────

/// Kind of network interface a platform reports as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterfaceKind {
    Wifi,
    Ethernet,
    Mobile,
    Vpn,
    Bluetooth,
    Other,
    /// The platform explicitly reports no connectivity.
    None,
}

impl InterfaceKind {
    pub fn is_connected(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A raw reading from a platform connectivity probe.
///
/// Some platforms report one interface, others a list of every active
/// interface. Both shapes stop at the monitor boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeReading {
    Single(InterfaceKind),
    Many(Vec<InterfaceKind>),
}

impl ProbeReading {
    /// Online iff at least one reported interface is connected.
    pub fn is_online(&self) -> bool {
        match self {
            Self::Single(kind) => kind.is_connected(),
            Self::Many(kinds) => kinds.iter().any(|k| k.is_connected()),
        }
    }
}

/// The probe itself failed; the connectivity state is unknown.
#[derive(Debug, Clone, Error)]
#[error("connectivity probe failed: {0}")]
pub struct ProbeError(pub String);

/// Platform connectivity primitive consumed by [`ConnectivityMonitor`].
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Take a single snapshot reading.
    async fn check(&self) -> Result<ProbeReading, ProbeError>;

    /// Push notifications of interface changes, if the platform has them.
    ///
    /// Probes without a native subscription return `None` and are polled.
    fn changes(&self) -> Option<BoxStream<'static, Result<ProbeReading, ProbeError>>> {
        None
    }
}

// ── ConnectivityState ────────────────────────────────────────────

/// Normalized host connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectivityState {
    is_online: bool,
}

impl ConnectivityState {
    pub const ONLINE: Self = Self { is_online: true };
    pub const OFFLINE: Self = Self { is_online: false };

    pub fn is_online(self) -> bool {
        self.is_online
    }

    pub fn is_offline(self) -> bool {
        !self.is_online
    }
}

impl From<&ProbeReading> for ConnectivityState {
    fn from(reading: &ProbeReading) -> Self {
        Self {
            is_online: reading.is_online(),
        }
    }
}

// ── ConnectivityMonitor ──────────────────────────────────────────

/// Watches host reachability and emits online/offline transitions.
///
/// Cheaply cloneable. The background task is started with
/// [`start()`](Self::start) and stopped with [`stop()`](Self::stop).
/// Readings are deduplicated: subscribers only see actual flips.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    probe: Arc<dyn ConnectivityProbe>,
    poll_interval: Duration,
    probe_timeout: Duration,
    /// `None` until the first successful reading.
    state: watch::Sender<Option<ConnectivityState>>,
    task: Mutex<Option<MonitorTask>>,
}

struct MonitorTask {
    cancel: CancellationToken,
    _handle: JoinHandle<()>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>, poll_interval: Duration) -> Self {
        Self::with_probe_timeout(probe, poll_interval, DEFAULT_PROBE_TIMEOUT)
    }

    /// Bound each snapshot probe by `timeout` (default 3s).
    pub fn with_probe_timeout(
        probe: Arc<dyn ConnectivityProbe>,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            inner: Arc::new(MonitorInner {
                probe,
                poll_interval,
                probe_timeout: timeout,
                state,
                task: Mutex::new(None),
            }),
        }
    }

    // ── State observation ────────────────────────────────────────

    /// Current connectivity. A host that has never been probed successfully
    /// is reported offline.
    pub fn current_state(&self) -> ConnectivityState {
        self.last_known().unwrap_or(ConnectivityState::OFFLINE)
    }

    /// The last published state, or `None` before the first reading.
    pub fn last_known(&self) -> Option<ConnectivityState> {
        *self.inner.state.borrow()
    }

    /// Subscribe to online/offline transitions.
    pub fn subscribe(&self) -> ConnectivityStream {
        ConnectivityStream::new(self.inner.state.subscribe())
    }

    // ── Probing ──────────────────────────────────────────────────

    /// Take one reading now, publish it if it flips the state, and return it.
    pub async fn refresh(&self) -> Result<ConnectivityState, ProbeError> {
        let reading = self.inner.check().await;
        let state = reading.as_ref().map(ConnectivityState::from).map_err(Clone::clone);
        self.inner.apply(reading);
        state
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the background watcher. No-op if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(monitor_task(Arc::clone(&self.inner), cancel.clone()));
        *task = Some(MonitorTask {
            cancel,
            _handle: handle,
        });
        debug!(poll_ms = self.inner.poll_interval.as_millis(), "connectivity monitor started");
    }

    /// Cancel the background watcher and its probe subscription. Idempotent.
    pub fn stop(&self) {
        let task = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            task.cancel.cancel();
            debug!("connectivity monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.task.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

impl MonitorInner {
    async fn check(&self) -> Result<ProbeReading, ProbeError> {
        match tokio::time::timeout(self.probe_timeout, self.probe.check()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError(format!(
                "no answer within {}ms",
                self.probe_timeout.as_millis()
            ))),
        }
    }

    /// Fold a reading into the published state. Returns `true` if it flipped.
    fn apply(&self, reading: Result<ProbeReading, ProbeError>) -> bool {
        let next = match reading {
            Ok(reading) => {
                trace!(?reading, "connectivity reading");
                ConnectivityState::from(&reading)
            }
            Err(e) => {
                warn!(error = %e, "connectivity probe failed; state unchanged");
                return false;
            }
        };

        let flipped = self.state.send_if_modified(|current| {
            if *current == Some(next) {
                false
            } else {
                *current = Some(next);
                true
            }
        });
        if flipped {
            info!(online = next.is_online(), "connectivity changed");
        }
        flipped
    }
}

// ── Background task ──────────────────────────────────────────────

/// Poll the probe on an interval and forward native change events.
async fn monitor_task(inner: Arc<MonitorInner>, cancel: CancellationToken) {
    let mut changes = inner.probe.changes();
    let mut interval = tokio::time::interval(inner.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = next_change(&mut changes) => {
                if let Some(reading) = event {
                    inner.apply(reading);
                } else {
                    debug!("probe subscription ended; falling back to polling");
                    changes = None;
                }
            }
            _ = interval.tick() => {
                let reading = inner.check().await;
                inner.apply(reading);
            }
        }
    }
}

async fn next_change(
    changes: &mut Option<BoxStream<'static, Result<ProbeReading, ProbeError>>>,
) -> Option<Result<ProbeReading, ProbeError>> {
    match changes {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
