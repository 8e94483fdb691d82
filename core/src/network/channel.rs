use std::io;
use std::sync::Mutex;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use pnet::packet::ethernet::{EtherType, EthernetPacket};
use tokio::sync::mpsc;
use tracing::warn;

use hostsweep_common::error::ScanError;

const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Sending half of a datalink channel plus a queue of captured frames.
///
/// The frames are read by a dedicated OS thread, because the pnet receiver
/// blocks. The thread exits once `rx` is dropped.
pub struct EthernetHandle {
    pub tx: Mutex<Box<dyn DataLinkSender>>,
    pub rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Opens an Ethernet channel on `intf` and forwards frames of `ether_type`.
pub fn start_capture(intf: &NetworkInterface, ether_type: EtherType) -> Result<EthernetHandle, ScanError> {
    let (tx, rx_socket) = open_ethernet_channel(intf)?;
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name(format!("capture-{}", intf.name))
        .spawn(move || listen(rx_socket, queue_tx, ether_type))
        .map_err(|e| ScanError::LinkChannel {
            interface: intf.name.clone(),
            reason: e.to_string(),
        })?;

    Ok(EthernetHandle {
        tx: Mutex::new(tx),
        rx: queue_rx,
    })
}

fn listen(
    mut rx_socket: Box<dyn DataLinkReceiver>,
    queue_tx: mpsc::UnboundedSender<Vec<u8>>,
    ether_type: EtherType,
) {
    loop {
        if queue_tx.is_closed() {
            break;
        }
        let frame = match rx_socket.next() {
            Ok(frame) => frame,
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => continue,
            Err(e) => {
                warn!(error = %e, "capture stopped");
                break;
            }
        };
        let matches = EthernetPacket::new(frame)
            .map(|eth| eth.get_ethertype() == ether_type)
            .unwrap_or(false);
        if matches && queue_tx.send(frame.to_vec()).is_err() {
            break;
        }
    }
}

fn open_ethernet_channel(
    intf: &NetworkInterface,
) -> Result<(Box<dyn DataLinkSender>, Box<dyn DataLinkReceiver>), ScanError> {
    let cfg = Config {
        read_timeout: Some(READ_TIMEOUT),
        ..Config::default()
    };
    let channel = datalink::channel(intf, cfg).map_err(|e| ScanError::LinkChannel {
        interface: intf.name.clone(),
        reason: e.to_string(),
    })?;

    match channel {
        Channel::Ethernet(tx, rx) => Ok((tx, rx)),
        _ => Err(ScanError::LinkChannel {
            interface: intf.name.clone(),
            reason: String::from("non-ethernet channel"),
        }),
    }
}
