//! # Subnet Arithmetic
//!
//! Pure IPv4 helpers used to turn an interface address into the list of
//! candidate hosts that share its subnet.
//!
//! Nothing in here performs I/O. Every function is deterministic, so the same
//! `(address, prefix)` pair always expands to the same ordered host list.

use std::net::Ipv4Addr;

/// Prefix lengths at or above this value are treated as a single physical segment.
pub const LOCAL_PREFIX_THRESHOLD: u8 = 24;

const IPV4_BITS: u8 = 32;

/// Number of usable hosts in a subnet of the given prefix length.
///
/// Returns `2^(32 - prefix) - 2` for `0 < prefix <= 32` and `0` otherwise.
/// The formula is kept as-is at `/32`, where it yields `-1`.
pub fn subnet_capacity(prefix: u8) -> i64 {
    if prefix == 0 || prefix > IPV4_BITS {
        return 0;
    }
    (1i64 << (IPV4_BITS - prefix)) - 2
}

/// Sum of [`subnet_capacity`] over every prefix assigned to an interface.
pub fn aggregate_capacity<I>(prefixes: I) -> i64
where
    I: IntoIterator<Item = u8>,
{
    prefixes.into_iter().map(subnet_capacity).sum()
}

/// Whether a subnet is small enough to probe at the link layer.
pub fn is_local_prefix(prefix: u8) -> bool {
    prefix >= LOCAL_PREFIX_THRESHOLD
}

/// Adds one to an address, carrying into the higher octets.
///
/// `255.255.255.255` wraps to `0.0.0.0`; the carry out of the top octet is discarded.
pub fn increment(addr: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(addr).wrapping_add(1))
}

/// Sorts addresses into ascending numeric order.
pub fn sort_addresses(addrs: &mut [Ipv4Addr]) {
    addrs.sort_unstable();
}

/// Expands an interface address into every usable host of its subnet, ascending.
pub fn enumerate_host_addresses(addr: Ipv4Addr, prefix: u8) -> Vec<Ipv4Addr> {
    SubnetSpan::from_cidr(addr, prefix).hosts().collect()
}

/// The inclusive `[network, broadcast]` range implied by an address and prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetSpan {
    pub network: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    prefix: u8,
}

impl SubnetSpan {
    pub fn from_cidr(addr: Ipv4Addr, prefix: u8) -> Self {
        let mask: u32 = netmask(prefix);
        let network: u32 = u32::from(addr) & mask;
        let broadcast: u32 = network | !mask;

        Self {
            network: Ipv4Addr::from(network),
            broadcast: Ipv4Addr::from(broadcast),
            prefix,
        }
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network <= addr && addr <= self.broadcast
    }

    /// Iterates the open interval `(network, broadcast)`.
    ///
    /// Prefixes outside `1..=32` have no usable hosts.
    pub fn hosts(&self) -> HostAddresses {
        let valid: bool = self.prefix > 0 && self.prefix <= IPV4_BITS;
        HostAddresses {
            next: increment(self.network),
            end: self.broadcast,
            done: !valid || self.network == self.broadcast,
        }
    }
}

/// Ascending iterator over the hosts strictly between a network and broadcast address.
#[derive(Debug, Clone)]
pub struct HostAddresses {
    next: Ipv4Addr,
    end: Ipv4Addr,
    done: bool,
}

impl Iterator for HostAddresses {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next >= self.end {
            self.done = true;
            return None;
        }
        let current: Ipv4Addr = self.next;
        self.next = increment(current);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done || self.next >= self.end {
            return (0, Some(0));
        }
        let remaining = (u32::from(self.end) - u32::from(self.next)) as usize;
        (remaining, Some(remaining))
    }
}

fn netmask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p if p >= IPV4_BITS => u32::MAX,
        p => u32::MAX << (IPV4_BITS - p),
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
