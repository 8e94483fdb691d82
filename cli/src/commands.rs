pub mod interfaces;
pub mod scan;

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hostsweep_common::config::{DEFAULT_MAX_IN_FLIGHT, DEFAULT_MAX_SUBNET_SIZE, ScanConfig};

#[derive(Parser)]
#[command(name = "hostsweep")]
#[command(about = "Finds the live hosts and the free addresses on your LAN.")]
#[command(args_conflicts_with_subcommands = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Show debug output (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep the subnets of every LAN interface (the default)
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// List the interfaces that would be swept
    #[command(alias = "i")]
    Interfaces,
}

/// Which addresses to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowMode {
    #[default]
    All,
    #[value(aliases = ["online", "used", "taken"])]
    Alive,
    #[value(aliases = ["offline", "unused", "free"])]
    Available,
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Only sweep this interface
    #[arg(short, long, value_name = "IFACE")]
    pub interface: Option<String>,

    /// Base probe timeout in milliseconds
    #[arg(short, long, value_name = "MS", default_value_t = 500)]
    pub timeout: u64,

    /// Print how long the scan took
    #[arg(short, long)]
    pub measure: bool,

    /// Which addresses to list; `alive` and `available` print bare addresses
    #[arg(long, value_enum, ignore_case = true, default_value_t = ShowMode::All)]
    pub show: ShowMode,

    /// Bare addresses, one per line, no decoration
    #[arg(short, long)]
    pub scriptable: bool,

    /// Also try well-known TCP ports when a host ignores ARP and ICMP
    #[arg(long)]
    pub port_fallback: bool,

    /// Skip interfaces with more usable addresses than this (0 = no limit)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_SUBNET_SIZE)]
    pub max_subnet_size: i64,

    /// Upper bound on probes in flight at once
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,
}

impl ScanArgs {
    /// Narrowed views only make sense piped into other tools.
    pub fn is_scriptable(&self) -> bool {
        self.scriptable || self.show != ShowMode::All
    }

    pub fn to_config(&self) -> ScanConfig {
        ScanConfig {
            timeout: Duration::from_millis(self.timeout),
            max_in_flight: self.max_in_flight,
            max_subnet_size: (self.max_subnet_size > 0).then_some(self.max_subnet_size),
            port_fallback: self.port_fallback,
            ..ScanConfig::default()
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
