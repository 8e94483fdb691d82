//! Link-layer (ARP) resolution probe.
//!
//! One [`ArpProbe`] serves a whole interface: it owns a single Ethernet
//! channel, and probes register a waiter for the address they asked about
//! before broadcasting a request. Replies are matched back to waiters by the
//! sender protocol address.
//!
//! Requires **root privileges** to open the datalink channel.

use std::collections::HashMap;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pnet::datalink::{DataLinkSender, NetworkInterface};
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::util::MacAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::trace;

use hostsweep_common::error::{ProbeError, ScanError};

use super::{ProbeTarget, ReachabilityMethod};
use crate::network::channel::{self, EthernetHandle};

pub const ETH_HDR_LEN: usize = 14;
pub const ARP_LEN: usize = 28;

type Waiters = Arc<Mutex<HashMap<Ipv4Addr, oneshot::Sender<MacAddr>>>>;

pub struct ArpProbe {
    interface: String,
    src_mac: MacAddr,
    tx: Mutex<Box<dyn DataLinkSender>>,
    waiters: Waiters,
    dispatcher: JoinHandle<()>,
}

impl ArpProbe {
    /// Opens the interface's Ethernet channel and starts matching replies.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(intf: &NetworkInterface) -> Result<Self, ScanError> {
        let src_mac: MacAddr = intf.mac.ok_or_else(|| ScanError::LinkChannel {
            interface: intf.name.clone(),
            reason: String::from("interface has no hardware address"),
        })?;

        let EthernetHandle { tx, mut rx } = channel::start_capture(intf, EtherTypes::Arp)?;
        let waiters: Waiters = Arc::default();

        let dispatch_waiters: Waiters = waiters.clone();
        let dispatcher = tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                deliver_reply(&dispatch_waiters, &frame);
            }
        });

        Ok(Self {
            interface: intf.name.clone(),
            src_mac,
            tx,
            waiters,
            dispatcher,
        })
    }

    fn send(&self, packet: &[u8]) -> io::Result<()> {
        let mut tx = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.send_to(packet, None) {
            Some(result) => result,
            None => Err(io::Error::other("datalink sender refused the frame")),
        }
    }

    fn forget(&self, addr: &Ipv4Addr) {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(addr);
    }
}

impl Drop for ArpProbe {
    fn drop(&mut self) {
        // Dropping the receiver lets the capture thread exit.
        self.dispatcher.abort();
    }
}

#[async_trait]
impl ReachabilityMethod for ArpProbe {
    fn name(&self) -> &'static str {
        "arp"
    }

    async fn is_reachable(&self, target: &ProbeTarget, budget: Duration) -> Result<bool, ProbeError> {
        // The capture thread is gone, so no reply could ever be matched.
        if self.dispatcher.is_finished() {
            return Err(ProbeError::LinkUnavailable {
                interface: self.interface.clone(),
            });
        }
        let packet: Vec<u8> = create_arp_request(self.src_mac, target.source, target.addr)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.addr, reply_tx);

        if let Err(source) = self.send(&packet) {
            self.forget(&target.addr);
            return Err(ProbeError::Send {
                method: "arp",
                addr: target.addr,
                source,
            });
        }

        let answered: bool = matches!(tokio::time::timeout(budget, reply_rx).await, Ok(Ok(_)));
        self.forget(&target.addr);
        Ok(answered)
    }
}

/// Builds a broadcast ARP "who-has" frame.
pub fn create_arp_request(
    src_mac: MacAddr,
    src_addr: Ipv4Addr,
    target_addr: Ipv4Addr,
) -> Result<Vec<u8>, ProbeError> {
    let mut buffer = vec![0u8; ETH_HDR_LEN + ARP_LEN];

    {
        let mut eth = MutableEthernetPacket::new(&mut buffer[..])
            .ok_or(ProbeError::Packet("ethernet"))?;
        eth.set_destination(MacAddr::broadcast());
        eth.set_source(src_mac);
        eth.set_ethertype(EtherTypes::Arp);
    }

    {
        let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..]).ok_or(ProbeError::Packet("arp"))?;
        arp.set_hardware_type(ArpHardwareTypes::Ethernet);
        arp.set_protocol_type(EtherTypes::Ipv4);
        arp.set_hw_addr_len(6);
        arp.set_proto_addr_len(4);
        arp.set_operation(ArpOperations::Request);
        arp.set_sender_hw_addr(src_mac);
        arp.set_sender_proto_addr(src_addr);
        arp.set_target_hw_addr(MacAddr::zero());
        arp.set_target_proto_addr(target_addr);
    }

    Ok(buffer)
}

/// Extracts `(sender address, sender MAC)` from an ARP reply frame.
pub fn parse_arp_reply(frame: &[u8]) -> Option<(Ipv4Addr, MacAddr)> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(eth.payload())?;
    if arp.get_operation() != ArpOperations::Reply {
        return None;
    }
    Some((arp.get_sender_proto_addr(), arp.get_sender_hw_addr()))
}

/// Wakes the probe waiting on the replying address. Returns whether one was waiting.
fn deliver_reply(waiters: &Waiters, frame: &[u8]) -> bool {
    let Some((addr, mac)) = parse_arp_reply(frame) else {
        return false;
    };
    let waiter = waiters
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&addr);
    match waiter {
        Some(reply_tx) => {
            trace!(%addr, %mac, "arp reply");
            reply_tx.send(mac).is_ok()
        }
        None => false,
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
