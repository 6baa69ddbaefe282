//! `dashboard probe`: one connectivity reading plus a remote ping.

use std::sync::Arc;

use serde::Serialize;

use dashboard_config::ConfigError;
use dashboard_core::{ConnectivityProbe, ProbeReading, RemoteAvailabilityProbe};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct ProbeReport {
    online: bool,
    hosts: Vec<String>,
    interfaces: Vec<String>,
    probe_error: Option<String>,
    remote: RemoteCheck,
}

#[derive(Debug, Serialize)]
struct RemoteCheck {
    endpoint: Option<String>,
    reachable: bool,
    latency_ms: Option<u128>,
    error: Option<String>,
}

impl RemoteCheck {
    fn unconfigured() -> Self {
        Self {
            endpoint: None,
            reachable: false,
            latency_ms: None,
            error: Some("no endpoint configured".into()),
        }
    }
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (cfg, _) = super::load(global)?;

    let probe = cfg.connectivity.probe();
    let hosts = probe.hosts().to_vec();
    let (online, interfaces, probe_error) = match probe.check().await {
        Ok(reading) => (reading.is_online(), interface_names(&reading), None),
        Err(e) => (false, Vec::new(), Some(e.to_string())),
    };

    let remote = match dashboard_config::to_bootstrap_config(&cfg) {
        Err(ConfigError::MissingEndpoint) => RemoteCheck::unconfigured(),
        Err(e) => return Err(e.into()),
        Ok(bootstrap) => {
            let client = bootstrap.remote.build_client(bootstrap.call_timeout)?;
            let availability = RemoteAvailabilityProbe::new(Arc::new(client), bootstrap.call_timeout);
            let endpoint = Some(bootstrap.remote.endpoint.to_string());
            match availability.check().await {
                Ok(latency) => RemoteCheck {
                    endpoint,
                    reachable: true,
                    latency_ms: Some(latency.as_millis()),
                    error: None,
                },
                Err(e) => RemoteCheck {
                    endpoint,
                    reachable: false,
                    latency_ms: None,
                    error: Some(e.to_string()),
                },
            }
        }
    };

    let report = ProbeReport {
        online,
        hosts,
        interfaces,
        probe_error,
        remote,
    };
    let color = output::should_color();
    let rendered = output::render_single(global.output, &report, |r| detail(r, color))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn interface_names(reading: &ProbeReading) -> Vec<String> {
    match reading {
        ProbeReading::Single(kind) => vec![kind.to_string()],
        ProbeReading::Many(kinds) => kinds.iter().map(ToString::to_string).collect(),
    }
}

fn detail(report: &ProbeReport, color: bool) -> String {
    let network = if report.online { "online" } else { "offline" };
    let remote = match (&report.remote.latency_ms, &report.remote.error) {
        (Some(ms), _) => format!("reachable ({ms}ms)"),
        (None, Some(err)) => err.clone(),
        (None, None) => "unreachable".into(),
    };
    let mut pairs = vec![
        ("network", output::paint(network, report.online, color)),
        ("hosts", report.hosts.join(", ")),
        ("interfaces", report.interfaces.join(", ")),
    ];
    if let Some(ref err) = report.probe_error {
        pairs.push(("probe error", err.clone()));
    }
    if let Some(ref endpoint) = report.remote.endpoint {
        pairs.push(("endpoint", endpoint.clone()));
    }
    pairs.push(("remote", output::paint(&remote, report.remote.reachable, color)));
    output::detail_lines(&pairs)
}
