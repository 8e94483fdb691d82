use std::net::Ipv4Addr;
use std::time::Instant;

use anyhow::Context;
use colored::*;
use tracing::error;

use hostsweep_common::network::interface::LanInterface;
use hostsweep_common::report::{GlobalReport, InterfaceScan, ScanReport};
use hostsweep_core::engine::Engine;
use hostsweep_core::scanner;

use crate::commands::{ScanArgs, ShowMode};
use crate::terminal::{colors, print, spinner};

const COLUMN_GAP: &str = "   ";
const RULE: &str = "----------------";

pub async fn scan(args: &ScanArgs) -> anyhow::Result<()> {
    let started: Instant = Instant::now();
    let scriptable: bool = args.is_scriptable();

    let engine = Engine::new(args.to_config()).context("cannot start the scan engine")?;
    let interfaces: Vec<LanInterface> = match &args.interface {
        Some(name) => vec![engine.find_interface(name)?],
        None => engine
            .discover_interfaces()
            .context("cannot list network interfaces")?,
    };

    if !scriptable {
        let candidates: i64 = interfaces.iter().map(scanner::candidate_count).sum();
        spinner::start(&spinner::scanning_message(interfaces.len(), candidates));
    }
    let report: GlobalReport = engine.scan_interfaces(&interfaces).await;
    spinner::stop();

    render(&report, args.show, scriptable);

    if args.measure && !scriptable {
        let elapsed: String = format!("Execution time: {:?}", started.elapsed());
        print::print(&format!("{}", elapsed.bold().blue()));
    }
    Ok(())
}

fn render(report: &GlobalReport, show: ShowMode, scriptable: bool) {
    for scan in report.results.values() {
        let InterfaceScan { interface, outcome } = scan;
        let scan_report: &ScanReport = match outcome {
            Ok(scan_report) => scan_report,
            Err(e) => {
                error!("Error probing hosts on interface {}: {}", interface.name, e);
                continue;
            }
        };

        let lines: Vec<String> = if scriptable {
            scriptable_lines(scan_report, show)
        } else {
            table_lines(interface, scan_report, show)
        };
        for line in lines {
            print::print(&line);
        }
    }
}

/// Bare addresses, one per line. The `all` view lists the live hosts.
fn scriptable_lines(report: &ScanReport, show: ShowMode) -> Vec<String> {
    let hosts: Vec<Ipv4Addr> = match show {
        ShowMode::Alive | ShowMode::All => report.sorted_active(),
        ShowMode::Available => report.inactive_hosts(),
    };
    hosts.iter().map(Ipv4Addr::to_string).collect()
}

fn table_lines(interface: &LanInterface, report: &ScanReport, show: ShowMode) -> Vec<String> {
    if report.all_hosts.is_empty() {
        return vec![format!("    {}", "No hosts found on this interface.".purple())];
    }

    let active: Vec<String> = report.sorted_active().iter().map(Ipv4Addr::to_string).collect();
    let available: Vec<String> = report.inactive_hosts().iter().map(Ipv4Addr::to_string).collect();

    let active_title: String = format!("{} hosts online", active.len());
    let available_title: String = format!("{} IPs available", available.len());

    let mut columns: Vec<Column> = Vec::with_capacity(2);
    if show != ShowMode::Available {
        columns.push(Column::new("Active Hosts", active_title, active, colors::ACTIVE));
    }
    if show != ShowMode::Alive {
        columns.push(Column::new("Available IPs", available_title, available, colors::AVAILABLE));
    }

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{}",
        format!("Interface: {} [{}]", interface.name, interface.mac_string())
            .bold()
            .color(colors::PRIMARY)
    ));
    lines.push(row(&columns, |column| column.title.to_uppercase().bold().color(column.color)));
    lines.push(row(&columns, |column| column.summary.color(column.color)));
    lines.push(row(&columns, |_| RULE.normal()));

    let height: usize = columns.iter().map(|column| column.hosts.len()).max().unwrap_or(0);
    for i in 0..height {
        lines.push(row(&columns, |column| {
            column.hosts.get(i).map(String::as_str).unwrap_or("").normal()
        }));
    }

    lines.push(String::new());
    lines.push(format!(
        "Total IPs in subnet: {}",
        report.all_hosts.len().to_string().bold()
    ));
    lines.push(format!(
        "Hosts responding: {} ({:.1}%)",
        report.active_hosts.len().to_string().bold().color(colors::ACTIVE),
        report.response_rate()
    ));

    if let Some(e) = &report.first_error {
        let more: String = match report.suppressed_errors {
            0 => String::new(),
            n => format!(" (+{n} more)"),
        };
        lines.push(format!("{}", format!("Scan incomplete: {e}{more}").color(colors::ERROR)));
    }
    lines
}

struct Column {
    title: &'static str,
    summary: String,
    hosts: Vec<String>,
    color: Color,
    width: usize,
}

impl Column {
    fn new(title: &'static str, summary: String, hosts: Vec<String>, color: Color) -> Self {
        let width: usize = hosts
            .iter()
            .map(String::len)
            .chain([title.len(), summary.len(), RULE.len()])
            .max()
            .unwrap_or(0);
        Self { title, summary, hosts, color, width }
    }
}

/// Pads on the plain text before coloring, so escape codes do not skew alignment.
fn row<F>(columns: &[Column], cell: F) -> String
where
    F: Fn(&Column) -> ColoredString,
{
    let cells: Vec<String> = columns
        .iter()
        .map(|column| {
            let content: ColoredString = cell(column);
            let pad: usize = column.width.saturating_sub(content.input.len());
            format!("{}{}", content, " ".repeat(pad))
        })
        .collect();
    cells.join(COLUMN_GAP).trim_end().to_string()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
