//! Enumerates the host's interfaces and keeps the ones worth sweeping.

use std::io;

use pnet::datalink::{self, NetworkInterface};
use tracing::{debug, warn};

use hostsweep_common::config::ScanConfig;
use hostsweep_common::error::ScanError;
use hostsweep_common::network::interface::LanInterface;

/// Where raw interface descriptions come from.
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>>;
}

/// The operating system's interface table.
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        Ok(datalink::interfaces())
    }
}

/// Every viable LAN interface, in the order the source reports them.
///
/// Interfaces whose aggregate subnet capacity exceeds the configured ceiling
/// are skipped rather than swept.
pub fn discover_interfaces(
    source: &dyn InterfaceSource,
    cfg: &ScanConfig,
) -> Result<Vec<LanInterface>, ScanError> {
    let interfaces: Vec<NetworkInterface> = source.interfaces().map_err(ScanError::Enumeration)?;
    debug!(count = interfaces.len(), "enumerated network interfaces");

    let mut lan_interfaces: Vec<LanInterface> = Vec::new();
    for intf in &interfaces {
        let lan = match LanInterface::try_from(intf) {
            Ok(lan) => lan,
            Err(reason) => {
                debug!(interface = %intf.name, %reason, "skipping interface");
                continue;
            }
        };

        if let Some(ceiling) = cfg.max_subnet_size
            && lan.capacity() > ceiling
        {
            warn!(
                interface = %lan.name,
                capacity = lan.capacity(),
                ceiling,
                "subnet too large, skipping interface"
            );
            continue;
        }
        lan_interfaces.push(lan);
    }
    Ok(lan_interfaces)
}

/// Looks up one viable interface by name.
pub fn find_interface(
    source: &dyn InterfaceSource,
    cfg: &ScanConfig,
    name: &str,
) -> Result<LanInterface, ScanError> {
    discover_interfaces(source, cfg)?
        .into_iter()
        .find(|lan| lan.name == name)
        .ok_or_else(|| ScanError::InterfaceNotFound(name.to_string()))
}

/// Finds the raw pnet description of `name`, needed to open a datalink channel.
pub fn lookup_raw(source: &dyn InterfaceSource, name: &str) -> Result<NetworkInterface, ScanError> {
    source
        .interfaces()
        .map_err(ScanError::Enumeration)?
        .into_iter()
        .find(|intf| intf.name == name)
        .ok_or_else(|| ScanError::InterfaceNotFound(name.to_string()))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::{IpNetwork, Ipv4Network};
    use pnet::util::MacAddr;
    use std::net::Ipv4Addr;

    const IFF_UP: u32 = 1;
    const IFF_BROADCAST: u32 = 1 << 1;
    const IFF_LOOPBACK: u32 = 1 << 3;

    struct FixedInterfaces(Vec<NetworkInterface>);

    impl InterfaceSource for FixedInterfaces {
        fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    impl InterfaceSource for BrokenSource {
        fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
            Err(io::Error::other("netlink unavailable"))
        }
    }

    fn create_mock_interface(name: &str, ip: [u8; 4], prefix: u8, flags: u32) -> NetworkInterface {
        let net = Ipv4Network::new(Ipv4Addr::from(ip), prefix).unwrap();
        NetworkInterface {
            name: name.to_string(),
            description: "An interface".to_string(),
            index: 0,
            mac: Some(MacAddr(0x1, 0x2, 0x3, 0x4, 0x5, 0x6)),
            ips: vec![IpNetwork::V4(net)],
            flags,
        }
    }

    fn source() -> FixedInterfaces {
        FixedInterfaces(vec![
            create_mock_interface("lo", [127, 0, 0, 1], 8, IFF_UP | IFF_LOOPBACK),
            create_mock_interface("eth0", [192, 168, 1, 10], 24, IFF_UP | IFF_BROADCAST),
            create_mock_interface("eth1", [10, 0, 0, 2], 16, IFF_UP | IFF_BROADCAST),
            create_mock_interface("wlan0", [10, 1, 0, 2], 24, IFF_BROADCAST),
        ])
    }

    #[test]
    fn keeps_only_viable_interfaces_within_ceiling() {
        let found = discover_interfaces(&source(), &ScanConfig::default()).unwrap();
        let names: Vec<&str> = found.iter().map(|lan| lan.name.as_str()).collect();
        assert_eq!(names, vec!["eth0"]);
    }

    #[test]
    fn no_ceiling_admits_large_subnets() {
        let cfg = ScanConfig { max_subnet_size: None, ..ScanConfig::default() };
        let found = discover_interfaces(&source(), &cfg).unwrap();
        let names: Vec<&str> = found.iter().map(|lan| lan.name.as_str()).collect();
        assert_eq!(names, vec!["eth0", "eth1"]);
        assert_eq!(found[1].capacity(), 65_534);
    }

    #[test]
    fn find_interface_by_name() {
        let cfg = ScanConfig::default();
        let eth0 = find_interface(&source(), &cfg, "eth0").unwrap();
        assert_eq!(eth0.addresses(), &[Ipv4Addr::new(192, 168, 1, 10)]);

        let missing = find_interface(&source(), &cfg, "wlan0");
        assert!(matches!(missing, Err(ScanError::InterfaceNotFound(name)) if name == "wlan0"));
    }

    #[test]
    fn source_failure_is_an_enumeration_error() {
        let result = discover_interfaces(&BrokenSource, &ScanConfig::default());
        assert!(matches!(result, Err(ScanError::Enumeration(_))));
    }

    #[test]
    fn lookup_raw_returns_unfiltered_interface() {
        let lo = lookup_raw(&source(), "lo").unwrap();
        assert!(lo.is_loopback());
        assert!(lookup_raw(&source(), "tun0").is_err());
    }
}
