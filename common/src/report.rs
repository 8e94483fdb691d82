//! # Scan Results
//!
//! Completed, immutable results handed to presentation layers. Nothing here
//! represents in-progress state: a report exists only once every probe of
//! its scan has finished.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::error::ScanError;
use crate::network::interface::LanInterface;
use crate::network::range;

/// Result of sweeping one interface.
///
/// `first_error` follows a first-error-wins policy: later errors only bump
/// `suppressed_errors`. A report carrying an error may be incomplete, it is
/// not void.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Reachable addresses, deduplicated and in completion order.
    pub active_hosts: Vec<Ipv4Addr>,
    /// Every candidate address that was probed.
    pub all_hosts: Vec<Ipv4Addr>,
    pub first_error: Option<ScanError>,
    pub suppressed_errors: usize,
}

impl ScanReport {
    pub fn sorted_active(&self) -> Vec<Ipv4Addr> {
        let mut active: Vec<Ipv4Addr> = self.active_hosts.clone();
        range::sort_addresses(&mut active);
        active
    }

    /// Candidates that did not answer, derived from the two sets, ascending.
    pub fn inactive_hosts(&self) -> Vec<Ipv4Addr> {
        let active: HashSet<&Ipv4Addr> = self.active_hosts.iter().collect();
        let mut inactive: Vec<Ipv4Addr> = self
            .all_hosts
            .iter()
            .filter(|addr| !active.contains(addr))
            .copied()
            .collect();
        range::sort_addresses(&mut inactive);
        inactive
    }

    /// Share of candidates that responded, in percent.
    pub fn response_rate(&self) -> f64 {
        if self.all_hosts.is_empty() {
            return 0.0;
        }
        self.active_hosts.len() as f64 / self.all_hosts.len() as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.first_error.is_none()
    }
}

/// One slot of a [`GlobalReport`]: the interface and what its scan produced.
#[derive(Debug)]
pub struct InterfaceScan {
    pub interface: LanInterface,
    pub outcome: Result<ScanReport, ScanError>,
}

/// Results of sweeping every discovered interface.
#[derive(Debug, Default)]
pub struct GlobalReport {
    pub results: BTreeMap<String, InterfaceScan>,
    pub elapsed: Duration,
    pub total_candidates: i64,
}

impl GlobalReport {
    pub fn get(&self, name: &str) -> Option<&InterfaceScan> {
        self.results.get(name)
    }

    pub fn active_count(&self) -> usize {
        self.results
            .values()
            .filter_map(|scan| scan.outcome.as_ref().ok())
            .map(|report| report.active_hosts.len())
            .sum()
    }

    pub fn failed_interfaces(&self) -> impl Iterator<Item = (&String, &ScanError)> {
        self.results
            .iter()
            .filter_map(|(name, scan)| scan.outcome.as_ref().err().map(|e| (name, e)))
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
