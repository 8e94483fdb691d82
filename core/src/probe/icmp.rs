//! ICMP echo probing with jitter, retries and exponential backoff.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use socket2::Type;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tracing::{debug, trace};

use hostsweep_common::config::ScanConfig;
use hostsweep_common::error::{ProbeError, ScanError};

use super::{ProbeTarget, ReachabilityMethod};

const PAYLOAD_SIZE: usize = 56;

/// Sends echo requests to one address.
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Sends up to `count` echo requests within `timeout`; `true` on the first reply.
    async fn echo(&self, addr: Ipv4Addr, count: u16, timeout: Duration) -> Result<bool, ProbeError>;
}

/// Echo transport over a raw ICMPv4 socket shared by every probe of a scan.
pub struct RawSocketEcho {
    client: Client,
    interval: Duration,
}

impl RawSocketEcho {
    pub fn new(cfg: &ScanConfig) -> Result<Self, ScanError> {
        let config = Config::builder()
            .kind(ICMP::V4)
            .sock_type_hint(Type::RAW)
            .build();
        let client = Client::new(&config).map_err(|source| ScanError::ProbeSetup {
            what: "raw ICMP socket",
            source,
        })?;

        Ok(Self {
            client,
            interval: cfg.echo_interval,
        })
    }
}

#[async_trait]
impl EchoTransport for RawSocketEcho {
    async fn echo(&self, addr: Ipv4Addr, count: u16, timeout: Duration) -> Result<bool, ProbeError> {
        let mut pinger = self
            .client
            .pinger(IpAddr::V4(addr), PingIdentifier(rand::random()))
            .await;
        let per_request: Duration = (timeout / u32::from(count.max(1))).max(self.interval);
        pinger.timeout(per_request);

        let payload = [0u8; PAYLOAD_SIZE];
        for seq in 0..count {
            match pinger.ping(PingSequence(seq), &payload).await {
                Ok(_) => return Ok(true),
                Err(SurgeError::Timeout { .. }) => {}
                Err(SurgeError::IOError(source)) => {
                    return Err(ProbeError::Send {
                        method: "icmp",
                        addr,
                        source,
                    });
                }
                Err(e) => debug!(%addr, error = %e, "discarding malformed echo reply"),
            }
        }
        Ok(false)
    }
}

/// Echo requests with retry. Each retry doubles the previous timeout.
pub struct EchoProbe {
    transport: Arc<dyn EchoTransport>,
    attempts: u32,
    echo_count: u16,
    jitter_max: Duration,
}

impl EchoProbe {
    pub fn new(transport: Arc<dyn EchoTransport>, cfg: &ScanConfig) -> Self {
        Self {
            transport,
            attempts: cfg.icmp_attempts,
            echo_count: cfg.echo_count,
            jitter_max: cfg.jitter_max,
        }
    }

    /// Random pause before sending so thousands of probes do not fire in lockstep.
    async fn jitter(&self) {
        let max_ms = self.jitter_max.as_millis() as u64;
        if max_ms == 0 {
            return;
        }
        let delay = Duration::from_millis(rand::random_range(0..max_ms));
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl ReachabilityMethod for EchoProbe {
    fn name(&self) -> &'static str {
        "icmp"
    }

    async fn is_reachable(&self, target: &ProbeTarget, budget: Duration) -> Result<bool, ProbeError> {
        let mut timeout: Duration = budget;

        for attempt in 1..=self.attempts {
            self.jitter().await;
            if self.transport.echo(target.addr, self.echo_count, timeout).await? {
                return Ok(true);
            }
            trace!(addr = %target.addr, attempt, ?timeout, "no echo reply");
            timeout = timeout.saturating_mul(2);
        }
        Ok(false)
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
