//! Bootstrap and connectivity layer between `dashboard-api` and the UI.
//!
//! This crate takes a cold-started client from "nothing initialized" to
//! "fully operational" and keeps it usable when the network is not:
//!
//! - **[`BackoffPolicy`]**: pure retry-delay computation with jitter and
//!   conservative / aggressive / fast presets.
//!
//! - **[`ConnectivityMonitor`]**: normalizes a platform [`ConnectivityProbe`]
//!   into one online/offline boolean, published edge-triggered through a
//!   `watch` channel. [`TcpProbe`] is the portable probe.
//!
//! - **[`InitializationController`]**: runs NetworkCheck → ConfigValidation →
//!   RemoteInit → Authentication → DependencyInit with cancellable retries,
//!   broadcasting an [`InitializationStatus`] snapshot on every transition.
//!
//! - **[`RepositorySwitchboard`]**: binds all five data domains to either the
//!   live or the local implementation family and swaps them atomically, by
//!   request or automatically on connectivity flips.
//!
//! - **Domain model** ([`model`]) and the process-lifetime [`LocalStore`]
//!   backing the local repositories.

pub mod backoff;
pub mod bootstrap;
pub mod config;
pub mod connectivity;
pub mod convert;
pub mod error;
pub mod model;
pub mod remote;
pub mod repository;
pub mod store;
pub mod switchboard;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backoff::BackoffPolicy;
pub use bootstrap::{
    AuthState, BootstrapState, DependentService, ErrorKind, InitError, InitializationController,
    InitializationStatus, Phase, RunOutcome,
};
pub use config::{BootstrapConfig, RemoteConfig, TlsVerification};
pub use connectivity::{
    ConnectivityMonitor, ConnectivityProbe, ConnectivityState, ConnectivityStream, InterfaceKind,
    ProbeError, ProbeReading, TcpProbe,
};
pub use error::CoreError;
pub use model::{Feed, NewTodo, NewsItem, StreamInfo, TodoItem, WeatherReport};
pub use remote::{RemoteAvailabilityProbe, RemoteService};
pub use repository::{
    Domain, DomainFactory, FeedRepository, Mode, NewsRepository, RepositoryFactories,
    StreamRepository, TodoRepository, WeatherRepository,
};
pub use store::LocalStore;
pub use switchboard::{DomainStatus, RepositorySwitchboard};

pub use dashboard_api::Identity;
