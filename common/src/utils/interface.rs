use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};

/// IPv4 views over a pnet interface's address list.
pub trait NetworkInterfaceExtension {
    fn ipv4_nets(&self) -> impl Iterator<Item = Ipv4Network> + '_;

    fn has_ipv4(&self) -> bool {
        self.ipv4_nets().next().is_some()
    }
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn ipv4_nets(&self) -> impl Iterator<Item = Ipv4Network> + '_ {
        self.ips.iter().filter_map(|ip| match ip {
            IpNetwork::V4(net) => Some(*net),
            IpNetwork::V6(_) => None,
        })
    }
}
