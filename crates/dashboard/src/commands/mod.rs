//! Command handlers and the wiring they share.

pub mod bootstrap;
pub mod config_cmd;
pub mod probe;

use std::path::PathBuf;
use std::sync::Arc;

use dashboard_config::{Config, ConfigError};
use dashboard_core::{
    BootstrapConfig, ConnectivityMonitor, InitializationController, LocalStore, RemoteService,
    RepositoryFactories, RepositorySwitchboard,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in effect: `--config` or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(dashboard_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = config_file(global);
    let cfg = dashboard_config::load_config_from(&path)?;
    Ok((cfg, path))
}

fn to_bootstrap(cfg: &Config, path: &std::path::Path) -> Result<BootstrapConfig, CliError> {
    dashboard_config::to_bootstrap_config(cfg).map_err(|e| match e {
        ConfigError::MissingEndpoint => CliError::NoEndpoint {
            path: path.display().to_string(),
        },
        other => other.into(),
    })
}

/// Everything one invocation needs, wired from the loaded config.
pub struct Runtime {
    pub remote: Arc<dyn RemoteService>,
    pub monitor: ConnectivityMonitor,
    pub controller: InitializationController,
    pub switchboard: RepositorySwitchboard,
}

impl Runtime {
    pub fn build(cfg: &Config, path: &std::path::Path) -> Result<Self, CliError> {
        let bootstrap = to_bootstrap(cfg, path)?;
        let client = Arc::new(bootstrap.remote.build_client(bootstrap.call_timeout)?);
        let remote: Arc<dyn RemoteService> = client.clone();

        let monitor = ConnectivityMonitor::with_probe_timeout(
            Arc::new(cfg.connectivity.probe()),
            cfg.connectivity.poll_interval(),
            cfg.connectivity.probe_timeout(),
        );
        let controller =
            InitializationController::new(bootstrap, Arc::clone(&remote), monitor.clone());
        let factories = RepositoryFactories::standard(client, Arc::new(LocalStore::with_fixtures()));
        let switchboard = RepositorySwitchboard::new(controller.clone(), factories);

        Ok(Self {
            remote,
            monitor,
            controller,
            switchboard,
        })
    }
}
