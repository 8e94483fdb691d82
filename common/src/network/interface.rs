use std::net::Ipv4Addr;

use pnet::datalink::NetworkInterface;
use pnet::util::MacAddr;
use thiserror::Error;

use crate::network::range;
use crate::utils::interface::NetworkInterfaceExtension;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ViabilityError {
    /// The interface is administratively down.
    #[error("interface is down")]
    IsDown,
    #[error("interface is a loopback device")]
    IsLoopback,
    /// The interface does not support broadcast, so it is not a scannable LAN segment.
    #[error("interface does not support broadcast")]
    NotBroadcast,
    #[error("interface has no IPv4 address")]
    NoIpv4Address,
}

/// A network interface that qualified for scanning.
///
/// `addresses` and `prefix_lengths` are parallel lists; the only way to grow
/// them is [`LanInterface::add_address`], which keeps them the same length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanInterface {
    pub name: String,
    pub mac: Option<MacAddr>,
    addresses: Vec<Ipv4Addr>,
    prefix_lengths: Vec<u8>,
}

impl LanInterface {
    pub fn new(name: impl Into<String>, mac: Option<MacAddr>) -> Self {
        Self {
            name: name.into(),
            mac,
            addresses: Vec::new(),
            prefix_lengths: Vec::new(),
        }
    }

    pub fn with_address(mut self, addr: Ipv4Addr, prefix: u8) -> Self {
        self.add_address(addr, prefix);
        self
    }

    pub fn add_address(&mut self, addr: Ipv4Addr, prefix: u8) {
        self.addresses.push(addr);
        self.prefix_lengths.push(prefix);
    }

    pub fn addresses(&self) -> &[Ipv4Addr] {
        &self.addresses
    }

    pub fn prefix_lengths(&self) -> &[u8] {
        &self.prefix_lengths
    }

    /// `(address, prefix)` pairs in assignment order.
    pub fn subnets(&self) -> impl Iterator<Item = (Ipv4Addr, u8)> + '_ {
        self.addresses
            .iter()
            .copied()
            .zip(self.prefix_lengths.iter().copied())
    }

    /// Total usable hosts across every subnet on this interface.
    pub fn capacity(&self) -> i64 {
        range::aggregate_capacity(self.prefix_lengths.iter().copied())
    }

    pub fn mac_string(&self) -> String {
        self.mac
            .map(|mac| mac.to_string())
            .unwrap_or_else(|| String::from("-"))
    }
}

impl TryFrom<&NetworkInterface> for LanInterface {
    type Error = ViabilityError;

    fn try_from(interface: &NetworkInterface) -> Result<Self, Self::Error> {
        is_viable_lan_interface(interface)?;

        let mut lan = LanInterface::new(interface.name.clone(), interface.mac);
        for net in interface.ipv4_nets() {
            lan.add_address(net.ip(), net.prefix());
        }
        Ok(lan)
    }
}

/// Checks the flags and addresses that make an interface worth sweeping.
pub fn is_viable_lan_interface(interface: &NetworkInterface) -> Result<(), ViabilityError> {
    if !interface.is_up() {
        return Err(ViabilityError::IsDown);
    }
    if interface.is_loopback() {
        return Err(ViabilityError::IsLoopback);
    }
    if !interface.is_broadcast() {
        return Err(ViabilityError::NotBroadcast);
    }
    if !interface.has_ipv4() {
        return Err(ViabilityError::NoIpv4Address);
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
