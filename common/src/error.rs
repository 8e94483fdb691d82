//! Error taxonomy shared by the engine and its callers.
//!
//! A silent host is never an error: it is a normal "unreachable" outcome.
//! Errors mean a probe or a scan could not be carried out.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// Failure to carry out a single probe against one address.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to send {method} probe to {addr}: {source}")]
    Send {
        method: &'static str,
        addr: Ipv4Addr,
        #[source]
        source: io::Error,
    },
    #[error("link-layer resolution is unavailable on {interface}")]
    LinkUnavailable { interface: String },
    #[error("failed to build {0} packet")]
    Packet(&'static str),
}

/// Failure of a discovery call, an interface scan or the engine setup.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("raw socket access requires administrator privileges")]
    InsufficientPrivileges,
    #[error("failed to enumerate network interfaces: {0}")]
    Enumeration(#[source] io::Error),
    #[error("interface with name '{0}' not found")]
    InterfaceNotFound(String),
    #[error("failed to set up {what}: {source}")]
    ProbeSetup {
        what: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("failed to open link-layer channel on {interface}: {reason}")]
    LinkChannel { interface: String, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("scan task for {interface} failed: {reason}")]
    TaskFailed { interface: String, reason: String },
}
