use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

/// Starts the process-wide spinner. Later calls only update the message.
pub fn start(message: &str) {
    let pb = SPINNER.get_or_init(init_spinner);
    pb.set_message(message.to_string());
}

pub fn stop() {
    if let Some(pb) = SPINNER.get() {
        pb.finish_and_clear();
    }
}

fn init_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

    pb.set_style(style);
    pb.enable_steady_tick(TICK);
    pb
}

pub fn scanning_message(interfaces: usize, candidates: i64) -> String {
    format!(
        "Sweeping {} addresses on {} interface(s)...",
        candidates.to_string().green().bold(),
        interfaces.to_string().bold()
    )
}

/// Runs `f` with the spinner line cleared, so the output does not tear it.
pub fn suspend<F: FnOnce() -> R, R>(f: F) -> R {
    match SPINNER.get() {
        Some(pb) if !pb.is_finished() => pb.suspend(f),
        _ => f(),
    }
}

/// Log sink that writes to stderr around the spinner.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        suspend(|| io::stderr().write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
