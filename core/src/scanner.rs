//! # Scan Orchestrator
//!
//! Sweeps every candidate address of one interface.
//!
//! Each candidate becomes one Tokio task, but only after a permit has been
//! taken from the **admission gate**, a semaphore shared by every interface
//! scan of an engine. The gate bounds how many probes are in flight at once,
//! which keeps a sweep of a /16 within file-descriptor, ephemeral-port and
//! ARP-table limits.
//!
//! Probe tasks never touch shared results. They send their [`ProbeOutcome`]
//! over a channel to one collector task that owns the accumulator.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{info, warn};

use hostsweep_common::error::ScanError;
use hostsweep_common::network::interface::LanInterface;
use hostsweep_common::network::range::SubnetSpan;
use hostsweep_common::report::ScanReport;

use crate::probe::{ProbeOutcome, ProbeTarget, Prober};

const OUTCOME_QUEUE: usize = 1024;

/// Expands every subnet of `interface` into probe targets.
///
/// An address reachable through two assigned subnets is kept once, attributed
/// to the first subnet that produced it.
pub fn expand_candidates(interface: &LanInterface) -> Vec<ProbeTarget> {
    let mut seen: HashSet<Ipv4Addr> = HashSet::new();
    let mut targets: Vec<ProbeTarget> = Vec::new();

    for (addr, prefix) in interface.subnets() {
        let hosts = SubnetSpan::from_cidr(addr, prefix).hosts();
        targets.reserve(hosts.size_hint().0);
        for host in hosts {
            if seen.insert(host) {
                targets.push(ProbeTarget::new(host, addr, prefix));
            }
        }
    }
    targets
}

/// Number of addresses a sweep of `interface` actually probes.
///
/// Unlike [`LanInterface::capacity`] this counts overlapping subnets once and
/// never goes negative for a `/32`.
pub fn candidate_count(interface: &LanInterface) -> i64 {
    expand_candidates(interface).len() as i64
}

/// Probes every candidate of `interface` and waits for all of them.
///
/// The returned report lists active hosts in completion order; sorting is
/// left to the caller.
pub async fn scan_interface(
    interface: &LanInterface,
    prober: Arc<dyn Prober>,
    gate: Arc<Semaphore>,
) -> ScanReport {
    let candidates: Vec<ProbeTarget> = expand_candidates(interface);
    let all_hosts: Vec<Ipv4Addr> = candidates.iter().map(|target| target.addr).collect();
    info!(
        interface = %interface.name,
        candidates = all_hosts.len(),
        "sweeping interface"
    );

    let (outcome_tx, outcome_rx) = mpsc::channel::<ProbeOutcome>(OUTCOME_QUEUE);
    let collector = tokio::spawn(collect_outcomes(outcome_rx));

    let mut tasks: JoinSet<()> = JoinSet::new();
    let mut task_failures: Vec<JoinError> = Vec::new();

    for target in candidates {
        let Ok(permit) = gate.clone().acquire_owned().await else {
            warn!(interface = %interface.name, "admission gate closed, stopping dispatch");
            break;
        };
        let prober = prober.clone();
        let outcome_tx = outcome_tx.clone();

        tasks.spawn(async move {
            let outcome: ProbeOutcome = prober.probe(target).await;
            drop(permit);
            let _ = outcome_tx.send(outcome).await;
        });

        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                task_failures.push(e);
            }
        }
    }
    drop(outcome_tx);

    while let Some(finished) = tasks.join_next().await {
        if let Err(e) = finished {
            task_failures.push(e);
        }
    }

    let mut accumulator: Accumulator = match collector.await {
        Ok(accumulator) => accumulator,
        Err(e) => {
            let mut accumulator = Accumulator::default();
            accumulator.record_error(task_failed(interface, &e));
            accumulator
        }
    };
    for failure in &task_failures {
        accumulator.record_error(task_failed(interface, failure));
    }

    if accumulator.suppressed_errors > 0 {
        warn!(
            interface = %interface.name,
            suppressed = accumulator.suppressed_errors,
            "additional probe errors were dropped after the first"
        );
    }
    info!(
        interface = %interface.name,
        active = accumulator.active_hosts.len(),
        total = all_hosts.len(),
        "interface sweep complete"
    );

    ScanReport {
        active_hosts: accumulator.active_hosts,
        all_hosts,
        first_error: accumulator.first_error,
        suppressed_errors: accumulator.suppressed_errors,
    }
}

/// Results owned by the collector task.
#[derive(Default)]
struct Accumulator {
    active_hosts: Vec<Ipv4Addr>,
    seen: HashSet<Ipv4Addr>,
    first_error: Option<ScanError>,
    suppressed_errors: usize,
}

impl Accumulator {
    fn record(&mut self, outcome: ProbeOutcome) {
        match outcome.result {
            Ok(true) => {
                if self.seen.insert(outcome.addr) {
                    self.active_hosts.push(outcome.addr);
                }
            }
            Ok(false) => {}
            Err(e) => self.record_error(ScanError::from(e)),
        }
    }

    /// First error wins; later ones are only counted.
    fn record_error(&mut self, error: ScanError) {
        if self.first_error.is_none() {
            self.first_error = Some(error);
        } else {
            self.suppressed_errors += 1;
        }
    }
}

async fn collect_outcomes(mut outcome_rx: mpsc::Receiver<ProbeOutcome>) -> Accumulator {
    let mut accumulator = Accumulator::default();
    while let Some(outcome) = outcome_rx.recv().await {
        accumulator.record(outcome);
    }
    accumulator
}

fn task_failed(interface: &LanInterface, error: &JoinError) -> ScanError {
    ScanError::TaskFailed {
        interface: interface.name.clone(),
        reason: error.to_string(),
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
