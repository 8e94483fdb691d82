//! # Scan Engine
//!
//! Entry point for callers. The engine checks its preconditions once, then
//! sweeps interfaces concurrently, one task per interface, and merges the
//! per-interface reports into a [`GlobalReport`].
//!
//! All interface scans of one engine share a single admission gate, so the
//! in-flight limit holds across the whole run and not per interface.
//! A failure on one interface (no link channel, a panicking task) lands in
//! that interface's slot and never touches its siblings.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tracing::{info, warn};

use hostsweep_common::config::ScanConfig;
use hostsweep_common::error::ScanError;
use hostsweep_common::network::interface::LanInterface;
use hostsweep_common::network::range;
use hostsweep_common::report::{GlobalReport, InterfaceScan, ScanReport};

use crate::network::interface::{self, InterfaceSource, SystemInterfaces};
use crate::probe::arp::ArpProbe;
use crate::probe::icmp::{EchoProbe, EchoTransport, RawSocketEcho};
use crate::probe::tcp::PortProbe;
use crate::probe::{MultiMethodProbe, Prober};
use crate::scanner;

/// Builds the prober used for one interface.
pub trait ProberFactory: Send + Sync {
    fn build(&self, interface: &LanInterface) -> Result<Arc<dyn Prober>, ScanError>;
}

/// Builds [`MultiMethodProbe`]s on real sockets.
///
/// The ICMP transport is shared across interfaces; each interface with a local
/// subnet gets its own ARP channel. An interface whose ARP channel cannot be
/// opened is still swept with echo requests.
pub struct NetworkProberFactory {
    cfg: ScanConfig,
    echo: Arc<dyn EchoTransport>,
    source: Arc<dyn InterfaceSource>,
}

impl NetworkProberFactory {
    pub fn new(cfg: ScanConfig, echo: Arc<dyn EchoTransport>, source: Arc<dyn InterfaceSource>) -> Self {
        Self { cfg, echo, source }
    }

    fn wants_link_resolution(&self, interface: &LanInterface) -> bool {
        self.cfg.link_resolution
            && interface
                .prefix_lengths()
                .iter()
                .any(|&prefix| range::is_local_prefix(prefix))
    }

    fn open_link(&self, interface: &LanInterface) -> Result<ArpProbe, ScanError> {
        let raw = interface::lookup_raw(self.source.as_ref(), &interface.name)?;
        ArpProbe::open(&raw)
    }
}

impl ProberFactory for NetworkProberFactory {
    fn build(&self, interface: &LanInterface) -> Result<Arc<dyn Prober>, ScanError> {
        let echo = EchoProbe::new(self.echo.clone(), &self.cfg);
        let mut probe = MultiMethodProbe::new(self.cfg.timeout, Box::new(echo));

        if self.wants_link_resolution(interface) {
            match self.open_link(interface) {
                Ok(arp) => probe = probe.with_link(Box::new(arp)),
                Err(e) => warn!(
                    interface = %interface.name,
                    error = %e,
                    "link-layer resolution unavailable, falling back to echo"
                ),
            }
        }
        if self.cfg.port_fallback {
            probe = probe.with_ports(Box::new(PortProbe::new(self.cfg.ports.clone())));
        }
        Ok(Arc::new(probe))
    }
}

pub struct Engine {
    cfg: ScanConfig,
    factory: Arc<dyn ProberFactory>,
    source: Arc<dyn InterfaceSource>,
    gate: Arc<Semaphore>,
}

impl Engine {
    /// Checks privileges and opens the shared ICMP socket.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(cfg: ScanConfig) -> Result<Self, ScanError> {
        cfg.validate()?;
        ensure_privileged()?;

        let echo: Arc<dyn EchoTransport> = Arc::new(RawSocketEcho::new(&cfg)?);
        let source: Arc<dyn InterfaceSource> = Arc::new(SystemInterfaces);
        let factory = NetworkProberFactory::new(cfg.clone(), echo, source.clone());

        Ok(Self {
            gate: Arc::new(Semaphore::new(cfg.max_in_flight)),
            cfg,
            factory: Arc::new(factory),
            source,
        })
    }

    /// An engine that probes through `factory` instead of raw sockets.
    pub fn with_factory(cfg: ScanConfig, factory: Arc<dyn ProberFactory>) -> Result<Self, ScanError> {
        cfg.validate()?;
        Ok(Self {
            gate: Arc::new(Semaphore::new(cfg.max_in_flight)),
            cfg,
            factory,
            source: Arc::new(SystemInterfaces),
        })
    }

    pub fn with_interface_source(mut self, source: Arc<dyn InterfaceSource>) -> Self {
        self.source = source;
        self
    }

    pub fn discover_interfaces(&self) -> Result<Vec<LanInterface>, ScanError> {
        interface::discover_interfaces(self.source.as_ref(), &self.cfg)
    }

    /// Sweeps one already-discovered interface.
    pub async fn scan_interface(&self, interface: &LanInterface) -> Result<ScanReport, ScanError> {
        let prober: Arc<dyn Prober> = self.factory.build(interface)?;
        Ok(scanner::scan_interface(interface, prober, self.gate.clone()).await)
    }

    /// The viable interface called `name`.
    pub fn find_interface(&self, name: &str) -> Result<LanInterface, ScanError> {
        interface::find_interface(self.source.as_ref(), &self.cfg, name)
    }

    /// Looks up `name` among the viable interfaces and sweeps it.
    pub async fn scan_interface_named(&self, name: &str) -> Result<(LanInterface, ScanReport), ScanError> {
        let interface: LanInterface = self.find_interface(name)?;
        let report: ScanReport = self.scan_interface(&interface).await?;
        Ok((interface, report))
    }

    /// Sweeps every interface concurrently and waits for all of them.
    pub async fn scan_interfaces(&self, interfaces: &[LanInterface]) -> GlobalReport {
        let start = Instant::now();
        let total_candidates: i64 = interfaces.iter().map(scanner::candidate_count).sum();

        let mut tasks: JoinSet<InterfaceScan> = JoinSet::new();
        let mut pending: HashMap<Id, LanInterface> = HashMap::new();

        for lan in interfaces {
            let lan = lan.clone();
            let factory = self.factory.clone();
            let gate = self.gate.clone();

            let handle = tasks.spawn({
                let lan = lan.clone();
                async move {
                    let outcome = match factory.build(&lan) {
                        Ok(prober) => Ok(scanner::scan_interface(&lan, prober, gate).await),
                        Err(e) => {
                            warn!(interface = %lan.name, error = %e, "cannot probe interface");
                            Err(e)
                        }
                    };
                    InterfaceScan { interface: lan, outcome }
                }
            });
            pending.insert(handle.id(), lan);
        }

        let mut report = GlobalReport {
            total_candidates,
            ..GlobalReport::default()
        };

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, scan)) => {
                    pending.remove(&id);
                    report.results.insert(scan.interface.name.clone(), scan);
                }
                Err(e) => {
                    let Some(lan) = pending.remove(&e.id()) else {
                        continue;
                    };
                    warn!(interface = %lan.name, error = %e, "interface scan task failed");
                    let outcome = Err(ScanError::TaskFailed {
                        interface: lan.name.clone(),
                        reason: e.to_string(),
                    });
                    report.results.insert(lan.name.clone(), InterfaceScan { interface: lan, outcome });
                }
            }
        }

        report.elapsed = start.elapsed();
        info!(
            interfaces = report.results.len(),
            active = report.active_count(),
            elapsed = ?report.elapsed,
            "scan complete"
        );
        report
    }

    /// Discovers every viable interface and sweeps them all.
    pub async fn scan_all(&self) -> Result<GlobalReport, ScanError> {
        let interfaces: Vec<LanInterface> = self.discover_interfaces()?;
        Ok(self.scan_interfaces(&interfaces).await)
    }
}

/// Raw sockets and datalink channels need root.
pub fn ensure_privileged() -> Result<(), ScanError> {
    if !is_root::is_root() {
        return Err(ScanError::InsufficientPrivileges);
    }
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
