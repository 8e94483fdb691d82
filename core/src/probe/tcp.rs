use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

use hostsweep_common::error::ProbeError;

use super::{ProbeTarget, ReachabilityMethod};

/// Port-liveness fallback: a host is up if any well-known port accepts a connection.
pub struct PortProbe {
    ports: Vec<u16>,
}

impl PortProbe {
    pub fn new(ports: Vec<u16>) -> Self {
        Self { ports }
    }
}

#[async_trait]
impl ReachabilityMethod for PortProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn is_reachable(&self, target: &ProbeTarget, budget: Duration) -> Result<bool, ProbeError> {
        let connect_timeout: Duration = budget / 2;

        for &port in &self.ports {
            let socket_addr = SocketAddr::new(IpAddr::V4(target.addr), port);
            if let Ok(Ok(_stream)) = timeout(connect_timeout, TcpStream::connect(socket_addr)).await {
                trace!(addr = %target.addr, port, "port accepted connection");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
