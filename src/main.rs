use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use dotfiles_provision::logging::Log as _;
use dotfiles_provision::{cli, commands, exec, logging};

/// Exit status used when the run is interrupted.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    let command = match args.command {
        cli::Command::Install(_) => "install",
        cli::Command::Version => "version",
    };
    logging::init_subscriber(args.verbose, command);
    let log = Arc::new(logging::Logger::new(command));

    let handler_log = Arc::clone(&log);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_log.error("installation was aborted by user");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    }) {
        log.warn(&format!("cannot install interrupt handler: {e}"));
    }

    match args.command {
        cli::Command::Install(opts) => commands::install::run(
            &args.global,
            &opts,
            &log,
            Arc::new(exec::SystemExecutor),
        ),
        cli::Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
