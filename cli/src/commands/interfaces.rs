use colored::*;

use hostsweep_common::config::{DEFAULT_MAX_SUBNET_SIZE, ScanConfig};
use hostsweep_common::network::interface::LanInterface;
use hostsweep_core::network::interface::{self, SystemInterfaces};

use crate::terminal::{colors, print};

type Detail = (String, ColoredString);

/// Lists every viable LAN interface, including the ones a default scan would skip.
pub fn interfaces() -> anyhow::Result<()> {
    let cfg = ScanConfig {
        max_subnet_size: None,
        ..ScanConfig::default()
    };
    let found: Vec<LanInterface> = interface::discover_interfaces(&SystemInterfaces, &cfg)?;

    if found.is_empty() {
        print::print_status("No usable LAN interface found");
        return Ok(());
    }

    print::header("lan interfaces");
    for (idx, lan) in found.iter().enumerate() {
        print::tree_head(idx, &lan.name);
        print::as_tree_one_level(details(lan));
    }
    print::fat_separator();
    Ok(())
}

fn details(lan: &LanInterface) -> Vec<Detail> {
    let mut details: Vec<Detail> = lan
        .subnets()
        .map(|(addr, prefix)| {
            let value: ColoredString = format!(
                "{}/{}",
                addr.to_string().color(colors::IPV4_ADDR),
                prefix.to_string().color(colors::IPV4_PREFIX)
            )
            .normal();
            (String::from("IPv4"), value)
        })
        .collect();

    details.push((String::from("MAC"), lan.mac_string().color(colors::MAC_ADDR)));

    let capacity: i64 = lan.capacity();
    let hosts: ColoredString = if capacity > DEFAULT_MAX_SUBNET_SIZE {
        format!("{capacity} (skipped by default)").color(colors::ACCENT)
    } else {
        capacity.to_string().normal()
    };
    details.push((String::from("Hosts"), hosts));
    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
