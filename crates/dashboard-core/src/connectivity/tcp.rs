// ── TCP reachability probe ──
//
// Portable fallback probe: a host counts as online if at least one of the
// configured endpoints accepts a TCP connection.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::net::TcpStream;
use tracing::trace;

use super::{ConnectivityProbe, InterfaceKind, ProbeError, ProbeReading};

/// Probes a fixed list of `host:port` endpoints over TCP.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    hosts: Vec<String>,
    connect_timeout: Duration,
}

impl TcpProbe {
    pub fn new(hosts: Vec<String>, connect_timeout: Duration) -> Self {
        Self {
            hosts,
            connect_timeout,
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    async fn reach(&self, host: &str) -> InterfaceKind {
        match tokio::time::timeout(self.connect_timeout, TcpStream::connect(host)).await {
            Ok(Ok(_)) => {
                trace!(host, "probe endpoint reachable");
                InterfaceKind::Other
            }
            Ok(Err(e)) => {
                trace!(host, error = %e, "probe endpoint unreachable");
                InterfaceKind::None
            }
            Err(_) => {
                trace!(host, "probe endpoint timed out");
                InterfaceKind::None
            }
        }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn check(&self) -> Result<ProbeReading, ProbeError> {
        if self.hosts.is_empty() {
            return Err(ProbeError("no probe hosts configured".into()));
        }
        let kinds = join_all(self.hosts.iter().map(|h| self.reach(h))).await;
        Ok(ProbeReading::Many(kinds))
    }
}
