use std::collections::HashSet;
use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

use hostsweep_common::error::{ProbeError, ScanError};
use hostsweep_common::network::interface::LanInterface;
use hostsweep_core::engine::ProberFactory;
use hostsweep_core::network::interface::InterfaceSource;
use hostsweep_core::probe::{ProbeOutcome, ProbeTarget, Prober};

pub const IFF_UP: u32 = 1;
pub const IFF_BROADCAST: u32 = 1 << 1;
pub const IFF_LOOPBACK: u32 = 1 << 3;

/// Simulated network: a fixed set of live addresses, optional failures and
/// an instrumented in-flight counter shared by every prober it builds.
#[derive(Default)]
pub struct FakeNetwork {
    pub live: HashSet<Ipv4Addr>,
    pub failing: HashSet<Ipv4Addr>,
    pub broken_interfaces: HashSet<String>,
    pub latency: Duration,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub probed: Mutex<Vec<Ipv4Addr>>,
}

impl FakeNetwork {
    pub fn with_live(live: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        Self {
            live: live.into_iter().collect(),
            latency: Duration::from_millis(1),
            ..Self::default()
        }
    }

    /// Nothing answers.
    pub fn silent() -> Self {
        Self::with_live(Vec::<Ipv4Addr>::new())
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<Ipv4Addr> {
        self.probed.lock().unwrap().clone()
    }
}

pub struct FakeProber(Arc<FakeNetwork>);

#[async_trait]
impl Prober for FakeProber {
    async fn probe(&self, target: ProbeTarget) -> ProbeOutcome {
        let net = &self.0;
        let now = net.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        net.peak.fetch_max(now, Ordering::SeqCst);
        net.probed.lock().unwrap().push(target.addr);

        tokio::time::sleep(net.latency).await;
        net.in_flight.fetch_sub(1, Ordering::SeqCst);

        if net.failing.contains(&target.addr) {
            ProbeOutcome::failed(target.addr, ProbeError::Packet("icmp"))
        } else if net.live.contains(&target.addr) {
            ProbeOutcome::reachable(target.addr)
        } else {
            ProbeOutcome::unreachable(target.addr)
        }
    }
}

pub struct FakeFactory(pub Arc<FakeNetwork>);

impl ProberFactory for FakeFactory {
    fn build(&self, interface: &LanInterface) -> Result<Arc<dyn Prober>, ScanError> {
        if self.0.broken_interfaces.contains(&interface.name) {
            return Err(ScanError::LinkChannel {
                interface: interface.name.clone(),
                reason: String::from("device busy"),
            });
        }
        Ok(Arc::new(FakeProber(self.0.clone())))
    }
}

pub struct FixedInterfaces(pub Vec<NetworkInterface>);

impl InterfaceSource for FixedInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(self.0.clone())
    }
}

pub fn create_mock_interface(name: &str, nets: &[([u8; 4], u8)], flags: u32) -> NetworkInterface {
    let ips: Vec<IpNetwork> = nets
        .iter()
        .map(|&(ip, prefix)| IpNetwork::V4(Ipv4Network::new(Ipv4Addr::from(ip), prefix).unwrap()))
        .collect();
    NetworkInterface {
        name: name.to_string(),
        description: "An interface".to_string(),
        index: 0,
        mac: Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6)),
        ips,
        flags,
    }
}
