use std::time::Duration;

use crate::error::ScanError;

/// Well-known TCP ports tried by the port-liveness fallback, most likely first.
pub const COMMON_PORTS: &[u16] = &[
    // web
    80, 443, 8080, 8443, 8000, 8888,
    // remote access
    22, 23, 3389, 5900,
    // file sharing
    445, 139, 21,
    // databases
    1433, 3306, 5432, 6379, 27017,
    // mail
    25, 110, 143, 587, 993, 995,
    // dns / dhcp
    53, 67, 68,
    // misc
    123, 161, 500, 1723, 5060, 9100,
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;
pub const DEFAULT_MAX_SUBNET_SIZE: i64 = 1024;

/// Settings for one scan invocation.
///
/// Built once at startup and handed by reference to the engine; nothing in
/// the engine reads configuration from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Base probe timeout. ARP gets half of it, ICMP doubles it on each retry.
    pub timeout: Duration,
    /// Capacity of the admission gate shared by every probe of a scan.
    pub max_in_flight: usize,
    /// Interfaces whose aggregate subnet capacity exceeds this are skipped.
    pub max_subnet_size: Option<i64>,
    pub icmp_attempts: u32,
    /// Echo requests sent per ICMP attempt.
    pub echo_count: u16,
    pub echo_interval: Duration,
    /// Upper bound (exclusive) of the random delay before each ICMP attempt.
    pub jitter_max: Duration,
    pub link_resolution: bool,
    pub port_fallback: bool,
    pub ports: Vec<u16>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_subnet_size: Some(DEFAULT_MAX_SUBNET_SIZE),
            icmp_attempts: 3,
            echo_count: 2,
            echo_interval: Duration::from_millis(50),
            jitter_max: Duration::from_millis(100),
            link_resolution: true,
            port_fallback: false,
            ports: COMMON_PORTS.to_vec(),
        }
    }
}

impl ScanConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig("timeout must be greater than zero"));
        }
        if self.max_in_flight == 0 {
            return Err(ScanError::InvalidConfig("max_in_flight must be at least 1"));
        }
        if self.icmp_attempts == 0 {
            return Err(ScanError::InvalidConfig("icmp_attempts must be at least 1"));
        }
        if self.echo_count == 0 {
            return Err(ScanError::InvalidConfig("echo_count must be at least 1"));
        }
        if self.port_fallback && self.ports.is_empty() {
            return Err(ScanError::InvalidConfig("port fallback needs at least one port"));
        }
        Ok(())
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
