//! # Multi-Method Probe
//!
//! Decides whether a single candidate address is reachable by trying a
//! priority-ordered list of techniques and stopping at the first answer:
//!
//! 1. [`arp`]: link-layer resolution, local subnets only, half the timeout.
//! 2. [`icmp`]: echo requests with jitter, retries and exponential backoff.
//! 3. [`tcp`]: connect to well-known ports. Off unless configured.
//!
//! The orchestrator only sees the [`Prober`] trait, so probing strategies can
//! be swapped without touching the fan-out logic.

use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use hostsweep_common::error::ProbeError;
use hostsweep_common::network::range;

pub mod arp;
pub mod icmp;
pub mod tcp;

/// One unit of probing work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTarget {
    pub addr: Ipv4Addr,
    /// Interface address of the subnet the target was expanded from.
    pub source: Ipv4Addr,
    pub prefix: u8,
}

impl ProbeTarget {
    pub fn new(addr: Ipv4Addr, source: Ipv4Addr, prefix: u8) -> Self {
        Self { addr, source, prefix }
    }

    pub fn is_local(&self) -> bool {
        range::is_local_prefix(self.prefix)
    }
}

/// What one probe found out. `Err` means the address could not be probed,
/// which is different from probing it and hearing nothing back.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub addr: Ipv4Addr,
    pub result: Result<bool, ProbeError>,
}

impl ProbeOutcome {
    pub fn reachable(addr: Ipv4Addr) -> Self {
        Self { addr, result: Ok(true) }
    }

    pub fn unreachable(addr: Ipv4Addr) -> Self {
        Self { addr, result: Ok(false) }
    }

    pub fn failed(addr: Ipv4Addr, error: ProbeError) -> Self {
        Self { addr, result: Err(error) }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self.result, Ok(true))
    }
}

/// Determines the reachability of one address.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: ProbeTarget) -> ProbeOutcome;
}

/// A single reachability technique.
#[async_trait]
pub trait ReachabilityMethod: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(false)` means the target stayed silent for the whole `budget`.
    async fn is_reachable(&self, target: &ProbeTarget, budget: Duration) -> Result<bool, ProbeError>;
}

/// The layered prober used for real scans.
pub struct MultiMethodProbe {
    timeout: Duration,
    link: Option<Box<dyn ReachabilityMethod>>,
    echo: Box<dyn ReachabilityMethod>,
    ports: Option<Box<dyn ReachabilityMethod>>,
}

impl MultiMethodProbe {
    pub fn new(timeout: Duration, echo: Box<dyn ReachabilityMethod>) -> Self {
        Self {
            timeout,
            link: None,
            echo,
            ports: None,
        }
    }

    pub fn with_link(mut self, link: Box<dyn ReachabilityMethod>) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_ports(mut self, ports: Box<dyn ReachabilityMethod>) -> Self {
        self.ports = Some(ports);
        self
    }

    fn plan(&self, target: &ProbeTarget) -> Vec<(&dyn ReachabilityMethod, Duration)> {
        let mut steps: Vec<(&dyn ReachabilityMethod, Duration)> = Vec::with_capacity(3);
        if let Some(link) = self.link.as_deref()
            && target.is_local()
        {
            steps.push((link, self.timeout / 2));
        }
        steps.push((self.echo.as_ref(), self.timeout));
        if let Some(ports) = self.ports.as_deref() {
            steps.push((ports, self.timeout));
        }
        steps
    }
}

#[async_trait]
impl Prober for MultiMethodProbe {
    async fn probe(&self, target: ProbeTarget) -> ProbeOutcome {
        let mut first_error: Option<ProbeError> = None;
        let mut probed = false;

        for (method, budget) in self.plan(&target) {
            match method.is_reachable(&target, budget).await {
                Ok(true) => {
                    trace!(addr = %target.addr, method = method.name(), "host answered");
                    return ProbeOutcome::reachable(target.addr);
                }
                Ok(false) => probed = true,
                Err(e) => {
                    trace!(addr = %target.addr, method = method.name(), error = %e, "probe method failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if !probed => ProbeOutcome::failed(target.addr, e),
            _ => ProbeOutcome::unreachable(target.addr),
        }
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
