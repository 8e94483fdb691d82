mod commands;
mod terminal;

use commands::{CommandLine, Commands, interfaces, scan};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let scan_args = match commands.command {
        Some(Commands::Interfaces) => {
            logging::init_logging(log_level(commands.verbose, false))?;
            return interfaces::interfaces();
        }
        Some(Commands::Scan(args)) => args,
        None => commands.scan,
    };

    logging::init_logging(log_level(commands.verbose, scan_args.is_scriptable()))?;
    scan::scan(&scan_args).await
}

/// Scriptable output keeps stderr quiet unless asked otherwise.
fn log_level(verbose: bool, scriptable: bool) -> &'static str {
    match (verbose, scriptable) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    }
}
